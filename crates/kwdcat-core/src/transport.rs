//! Transport trait for CAT communication.
//!
//! The [`Transport`] trait abstracts over the byte stream to a transceiver.
//! The serial implementation lives in `kwdcat-transport`; a scripted mock
//! for tests lives in `kwdcat-test-harness`.
//!
//! Besides plain send/receive, the query engine needs to inspect and discard
//! whatever the device (or another program sharing the port) has already
//! buffered, so those operations are part of the trait.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a transceiver.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the device.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying port.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Waits up to `timeout` for
    /// data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if nothing is received within the deadline. A zero timeout polls.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Number of received bytes already buffered and readable without waiting.
    fn bytes_pending(&self) -> Result<usize>;

    /// Drop every byte currently sitting in the receive buffer.
    fn discard_input(&mut self) -> Result<()>;

    /// Drive the DTR control line.
    async fn set_dtr(&mut self, on: bool) -> Result<()>;

    /// Drive the RTS control line.
    async fn set_rts(&mut self, on: bool) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent calls should return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
