//! The request/reply transaction engine.
//!
//! One call to [`query`] runs a complete transaction against a transport:
//!
//! 1. Discard whatever is already in the receive buffer. The port may be
//!    shared with other programs polling the rig, and their replies must
//!    never be mistaken for ours.
//! 2. Send the trimmed request followed by `;`.
//! 3. For requests that expect no reply (`expected_len == 0`) stop here.
//! 4. Wait the settle interval, read until a `;` arrives, then also pull in
//!    any bytes already buffered behind it (frames often arrive back to back).
//! 5. Find the first occurrence of the request mnemonic in that text and
//!    accept the `expected_len` characters starting there only if a `;`
//!    follows immediately.
//!
//! Anything that fails step 5 is "no valid reply" (`Ok(None)`), which is an
//! ordinary outcome. Transport failures are returned as errors and are never
//! retried here.

use std::time::Duration;

use tracing::{debug, error, trace, warn};

use kwdcat_core::{Error, Result, Transport};

use crate::protocol::{self, TERMINATOR};

/// Cap on bytes gathered for one reply; well above any real frame burst.
const MAX_REPLY: usize = 4096;

/// Timing parameters for query transactions.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Delay between sending a request and starting to read its reply.
    pub settle_interval: Duration,
    /// Delay after a power-on command before the status query is retried.
    pub power_on_delay: Duration,
    /// Deadline for each transport receive while reading a reply.
    pub receive_timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            settle_interval: Duration::from_millis(100),
            power_on_delay: Duration::from_secs(1),
            receive_timeout: Duration::from_millis(500),
        }
    }
}

/// Run one request/reply transaction.
///
/// Returns `Ok(Some(reply))` with exactly `expected_len` characters starting
/// at the request mnemonic, `Ok(None)` when no valid reply was found (or
/// none was expected), and `Err` when the transport itself failed.
pub async fn query(
    transport: &mut dyn Transport,
    config: &QueryConfig,
    request: &str,
    expected_len: usize,
) -> Result<Option<String>> {
    let request = request.trim();
    if request.is_empty() {
        return Err(Error::InvalidParameter("empty CAT request".into()));
    }

    match transport.bytes_pending() {
        Ok(stale) if stale > 0 => {
            warn!(request, stale, "discarding unread input before request");
        }
        _ => {}
    }
    transport.discard_input()?;

    let frame = protocol::encode_request(request);
    if let Err(e) = transport.send(&frame).await {
        error!(request, error = %e, "failed to send CAT request");
        return Err(e);
    }
    debug!(request, expected_len, "CAT request sent");

    if expected_len == 0 {
        return Ok(None);
    }

    tokio::time::sleep(config.settle_interval).await;

    let mut raw = read_until(transport, TERMINATOR, config.receive_timeout).await?;
    drain_pending(transport, &mut raw, config.receive_timeout).await?;

    let text = String::from_utf8_lossy(&raw);
    trace!(request, raw = %text, len = raw.len(), "CAT reply bytes");

    match locate_reply(&text, request, expected_len) {
        Some(reply) => {
            debug!(request, reply, "valid CAT reply");
            Ok(Some(reply.to_string()))
        }
        None => {
            debug!(request, raw = %text, "no valid reply");
            Ok(None)
        }
    }
}

/// Find the reply to `request` inside accumulated reply text.
///
/// The reply starts at the first occurrence of `request` and must be
/// followed by the terminator exactly `expected_len` characters later.
///
/// # Example
///
/// ```
/// use kwdcat::query::locate_reply;
///
/// let raw = "FB00007000000;FA00014049680;";
/// assert_eq!(locate_reply(raw, "FA", 13), Some("FA00014049680"));
/// assert_eq!(locate_reply(raw, "FA", 12), None);
/// assert_eq!(locate_reply(raw, "IF", 37), None);
/// ```
pub fn locate_reply<'a>(text: &'a str, request: &str, expected_len: usize) -> Option<&'a str> {
    if request.is_empty() {
        return None;
    }
    let start = text.find(request)?;
    let end = start.checked_add(expected_len)?;
    if *text.as_bytes().get(end)? != TERMINATOR {
        return None;
    }
    text.get(start..end)
}

/// Read until the terminator has been seen or a receive times out.
///
/// A timeout is not an error here: whatever arrived (possibly nothing) is
/// returned for the caller to judge.
pub async fn read_until(
    transport: &mut dyn Transport,
    terminator: u8,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let mut buf = [0u8; 256];
    let mut raw = Vec::new();

    loop {
        match transport.receive(&mut buf, timeout).await {
            Ok(0) => break,
            Ok(n) => {
                raw.extend_from_slice(&buf[..n]);
                if buf[..n].contains(&terminator) {
                    break;
                }
                if raw.len() > MAX_REPLY {
                    warn!(len = raw.len(), "reply exceeds buffer limit, giving up");
                    break;
                }
            }
            Err(Error::Timeout) => {
                trace!(len = raw.len(), "receive timed out");
                break;
            }
            Err(e) => {
                error!(error = %e, "failed to read CAT reply");
                return Err(e);
            }
        }
    }

    Ok(raw)
}

/// Append the bytes that are already buffered on the transport to `raw`.
///
/// Only what is pending when called is read, so a chatty device cannot keep
/// the transaction open.
pub async fn drain_pending(
    transport: &mut dyn Transport,
    raw: &mut Vec<u8>,
    timeout: Duration,
) -> Result<()> {
    let mut pending = transport.bytes_pending()?.min(MAX_REPLY);
    let mut buf = [0u8; 256];

    while pending > 0 {
        let want = pending.min(buf.len());
        match transport.receive(&mut buf[..want], timeout).await {
            Ok(0) | Err(Error::Timeout) => break,
            Ok(n) => {
                raw.extend_from_slice(&buf[..n]);
                pending = pending.saturating_sub(n);
            }
            Err(e) => {
                error!(error = %e, "failed to drain pending bytes");
                return Err(e);
            }
        }
    }

    Ok(())
}
