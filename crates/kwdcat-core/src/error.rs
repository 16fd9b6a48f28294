//! Error types for kwdcat.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, unanswered
//! requests, and frames that do not fit their grammar are all captured here
//! so callers can branch on the outcome instead of inspecting logs.

/// The error type for all kwdcat operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial port (or other byte stream) could not be opened.
    #[error("failed to open transport: {0}")]
    TransportOpen(String),

    /// Writing a request to the transport failed.
    #[error("transport write failed: {0}")]
    TransportWrite(String),

    /// Reading from the transport failed for a reason other than a timeout.
    #[error("transport read failed: {0}")]
    TransportRead(String),

    /// The device did not answer the request recognizably.
    ///
    /// Either nothing arrived before the receive timeout, or the bytes that
    /// did arrive did not contain a correctly terminated reply to `request`.
    #[error("no reply to {request}")]
    NoReply {
        /// The request mnemonic that went unanswered (e.g. `"IF"`).
        request: String,
    },

    /// A reply was received but does not match the expected frame grammar.
    #[error("{frame} frame does not match its grammar: {text:?}")]
    GrammarMismatch {
        /// Name of the frame that was expected (e.g. `"IF"`).
        frame: &'static str,
        /// The text that failed to decode.
        text: String,
    },

    /// A mode code outside 1-9 was supplied or received.
    #[error("invalid mode code: {0}")]
    InvalidModeCode(u8),

    /// The device did not answer a status query, even after a power-on
    /// command and one retry.
    #[error(
        "device is not responding; check cabling, port settings and drivers \
         (some virtual port drivers need the physical port to be open)"
    )]
    Unresponsive,

    /// Timed out waiting for bytes from the transport.
    #[error("timeout waiting for data")]
    Timeout,

    /// The transport is closed or was never opened.
    #[error("not connected")]
    NotConnected,

    /// An invalid parameter was passed to a command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport_open() {
        let e = Error::TransportOpen("/dev/ttyUSB0: no such file".into());
        assert_eq!(
            e.to_string(),
            "failed to open transport: /dev/ttyUSB0: no such file"
        );
    }

    #[test]
    fn error_display_no_reply() {
        let e = Error::NoReply {
            request: "IF".into(),
        };
        assert_eq!(e.to_string(), "no reply to IF");
    }

    #[test]
    fn error_display_grammar_mismatch() {
        let e = Error::GrammarMismatch {
            frame: "PC",
            text: "PC1X0".into(),
        };
        assert_eq!(
            e.to_string(),
            "PC frame does not match its grammar: \"PC1X0\""
        );
    }

    #[test]
    fn error_display_invalid_mode_code() {
        assert_eq!(Error::InvalidModeCode(0).to_string(), "invalid mode code: 0");
    }

    #[test]
    fn error_display_unresponsive_mentions_cabling() {
        let msg = Error::Unresponsive.to_string();
        assert!(msg.contains("not responding"));
        assert!(msg.contains("cabling"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
