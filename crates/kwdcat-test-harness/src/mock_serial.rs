//! Mock transport for deterministic testing of the CAT engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait over an in-memory
//! receive buffer. Each `send()` is matched against the next scripted
//! expectation, whose reply bytes are appended to the receive buffer just
//! as a real device's answer would land in the serial driver's buffer.
//! Bytes can also be injected directly to simulate traffic meant for other
//! programs sharing the port.
//!
//! # Example
//!
//! ```
//! use kwdcat_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // A stale frame left over from some other program's request.
//! mock.inject(b"FB00007000000;");
//! // When the engine sends `FA;`, the device answers.
//! mock.expect(b"FA;", b"FA00014049680;");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use kwdcat_core::error::{Error, Result};
use kwdcat_core::transport::Transport;

/// A pre-loaded request/reply pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// Bytes appended to the receive buffer once the request is seen.
    reply: Vec<u8>,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. A `send()` that does not match the
/// next expectation, or arrives when none are left, fails with
/// [`Error::TransportWrite`]. `receive()` hands out buffered bytes and
/// returns [`Error::Timeout`] once the buffer is empty.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/reply pairs.
    expectations: VecDeque<Expectation>,
    /// Bytes "received" from the device and not yet read.
    rx: VecDeque<u8>,
    /// Maximum bytes handed out per `receive()` call.
    chunk_size: usize,
    /// Whether the transport is "connected".
    connected: bool,
    /// When set, every `send()` fails.
    fail_writes: bool,
    /// Receives left to succeed before every `receive()` fails.
    reads_before_failure: Option<usize>,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
    /// Number of `receive()` calls made.
    receive_calls: usize,
    /// Number of `discard_input()` calls made.
    discard_calls: usize,
    /// Total bytes thrown away by `discard_input()`.
    discarded_bytes: usize,
    /// Last levels driven on the control lines.
    dtr: bool,
    rts: bool,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            rx: VecDeque::new(),
            chunk_size: usize::MAX,
            connected: true,
            fail_writes: false,
            reads_before_failure: None,
            sent_log: Vec::new(),
            receive_calls: 0,
            discard_calls: 0,
            discarded_bytes: 0,
            dtr: false,
            rts: false,
        }
    }

    /// Add an expected request and the bytes the device answers with.
    ///
    /// Pass an empty `reply` for a device that stays silent.
    pub fn expect(&mut self, request: &[u8], reply: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            reply: reply.to_vec(),
        });
    }

    /// Add an expected request that produces no reply (fire-and-forget).
    pub fn expect_write(&mut self, request: &[u8]) {
        self.expect(request, b"");
    }

    /// Append bytes to the receive buffer as if they had just arrived.
    pub fn inject(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Limit how many bytes a single `receive()` returns.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
    }

    /// Make every subsequent `send()` fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make every subsequent `receive()` fail with [`Error::TransportRead`].
    ///
    /// Buffered bytes stay in place and still count as pending.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.reads_before_failure = fail.then_some(0);
    }

    /// Let `reads` more `receive()` calls succeed, then fail the rest as
    /// [`set_fail_reads`](Self::set_fail_reads) does.
    pub fn fail_reads_after(&mut self, reads: usize) {
        self.reads_before_failure = Some(reads);
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent calls return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Return all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of times `receive()` has been called.
    pub fn receive_calls(&self) -> usize {
        self.receive_calls
    }

    /// Number of times `discard_input()` has been called.
    pub fn discard_calls(&self) -> usize {
        self.discard_calls
    }

    /// Total number of bytes dropped by `discard_input()`.
    pub fn discarded_bytes(&self) -> usize {
        self.discarded_bytes
    }

    /// Bytes still waiting in the receive buffer.
    pub fn unread(&self) -> usize {
        self.rx.len()
    }

    /// Last level driven on DTR.
    pub fn dtr(&self) -> bool {
        self.dtr
    }

    /// Last level driven on RTS.
    pub fn rts(&self) -> bool {
        self.rts
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.fail_writes {
            return Err(Error::TransportWrite("simulated write failure".into()));
        }

        self.sent_log.push(data.to_vec());

        match self.expectations.pop_front() {
            Some(expectation) if data == expectation.request.as_slice() => {
                self.rx.extend(expectation.reply);
                Ok(())
            }
            Some(expectation) => Err(Error::TransportWrite(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            ))),
            None => Err(Error::TransportWrite(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.receive_calls += 1;

        match self.reads_before_failure.as_mut() {
            Some(0) => return Err(Error::TransportRead("simulated read failure".into())),
            Some(left) => *left -= 1,
            None => {}
        }
        if self.rx.is_empty() {
            return Err(Error::Timeout);
        }
        let n = self.rx.len().min(buf.len()).min(self.chunk_size);
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn bytes_pending(&self) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        Ok(self.rx.len())
    }

    fn discard_input(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.discard_calls += 1;
        self.discarded_bytes += self.rx.len();
        self.rx.clear();
        Ok(())
    }

    async fn set_dtr(&mut self, on: bool) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.dtr = on;
        Ok(())
    }

    async fn set_rts(&mut self, on: bool) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.rts = on;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.rx.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"FA;", b"FA00014049680;");

        mock.send(b"FA;").await.unwrap();
        assert_eq!(mock.bytes_pending().unwrap(), 14);

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"FA00014049680;");
        assert_eq!(mock.bytes_pending().unwrap(), 0);
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        mock.expect_write(b"UP;");
        mock.expect_write(b"DN;");

        mock.send(b"UP;").await.unwrap();
        mock.send(b"DN;").await.unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[0], b"UP;");
        assert_eq!(mock.sent_data()[1], b"DN;");
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect_write(b"PS1;");

        let result = mock.send(b"PS0;").await;
        assert!(matches!(result, Err(Error::TransportWrite(_))));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.send(b"IF;").await;
        assert!(matches!(result, Err(Error::TransportWrite(_))));
    }

    #[tokio::test]
    async fn mock_transport_simulated_write_failure() {
        let mut mock = MockTransport::new();
        mock.expect_write(b"UP;");
        mock.set_fail_writes(true);

        let result = mock.send(b"UP;").await;
        assert!(matches!(result, Err(Error::TransportWrite(_))));
        assert!(mock.sent_data().is_empty());
        assert_eq!(mock.remaining_expectations(), 1);
    }

    #[tokio::test]
    async fn mock_transport_simulated_read_failure() {
        let mut mock = MockTransport::new();
        mock.inject(b"PC050;");
        mock.set_fail_reads(true);

        let mut buf = [0u8; 16];
        let result = mock.receive(&mut buf, Duration::ZERO).await;
        assert!(matches!(result, Err(Error::TransportRead(_))));
        assert_eq!(mock.unread(), 6);
        assert_eq!(mock.bytes_pending().unwrap(), 6);
    }

    #[tokio::test]
    async fn mock_transport_read_failure_after_count() {
        let mut mock = MockTransport::new();
        mock.inject(b"PC050;");
        mock.set_chunk_size(3);
        mock.fail_reads_after(1);

        let mut buf = [0u8; 16];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"PC0");
        let result = mock.receive(&mut buf, Duration::ZERO).await;
        assert!(matches!(result, Err(Error::TransportRead(_))));
    }

    #[tokio::test]
    async fn mock_transport_receive_empty_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 16];

        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(mock.receive_calls(), 1);
    }

    #[tokio::test]
    async fn mock_transport_chunked_receive() {
        let mut mock = MockTransport::new();
        mock.inject(b"PC050;");
        mock.set_chunk_size(4);

        let mut buf = [0u8; 16];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"PC05");
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"0;");
    }

    #[tokio::test]
    async fn mock_transport_discard_input() {
        let mut mock = MockTransport::new();
        mock.inject(b"FB00007000000;");

        mock.discard_input().unwrap();
        assert_eq!(mock.unread(), 0);
        assert_eq!(mock.discard_calls(), 1);
        assert_eq!(mock.discarded_bytes(), 14);
    }

    #[tokio::test]
    async fn mock_transport_control_lines() {
        let mut mock = MockTransport::new();
        mock.set_dtr(true).await.unwrap();
        mock.set_rts(true).await.unwrap();
        assert!(mock.dtr());
        assert!(mock.rts());
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(b"IF;").await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(matches!(mock.bytes_pending(), Err(Error::NotConnected)));
    }
}
