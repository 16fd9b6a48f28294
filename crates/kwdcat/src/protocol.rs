//! Kenwood CAT wire framing.
//!
//! Every request and every reply is ASCII text terminated by a single `;`.
//! Requests are a two- or three-letter mnemonic plus optional parameter
//! digits (e.g. `IF`, `FA`, `UD0105`, `PS1`). Surrounding whitespace is
//! stripped before the terminator is appended.
//!
//! ```text
//! <mnemonic><params>;
//! ```

use bytes::{BufMut, BytesMut};

/// CAT request/reply terminator byte.
pub const TERMINATOR: u8 = b';';

/// Encode request text into the bytes sent on the wire.
///
/// # Example
///
/// ```
/// use kwdcat::protocol::encode_request;
///
/// assert_eq!(encode_request("IF"), b"IF;");
/// assert_eq!(encode_request("  UD0105 \n"), b"UD0105;");
/// ```
pub fn encode_request(request: &str) -> Vec<u8> {
    let body = request.trim();
    let mut buf = BytesMut::with_capacity(body.len() + 1);
    buf.put_slice(body.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_terminator() {
        assert_eq!(encode_request("FA"), b"FA;");
        assert_eq!(encode_request("PS1"), b"PS1;");
    }

    #[test]
    fn encode_strips_whitespace() {
        assert_eq!(encode_request(" IF "), b"IF;");
        assert_eq!(encode_request("\tRT1\r\n"), b"RT1;");
    }

    #[test]
    fn encode_empty_is_bare_terminator() {
        assert_eq!(encode_request(""), b";");
    }
}
