//! SessionBuilder -- fluent builder for constructing [`Session`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial line parameters and transaction timing before the port is opened.
//!
//! # Example
//!
//! ```no_run
//! use kwdcat::SessionBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> kwdcat_core::Result<()> {
//! let mut session = SessionBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .receive_timeout(Duration::from_millis(300))
//!     .build()
//!     .await?;
//! session.ensure_responding().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use kwdcat_core::error::{Error, Result};
use kwdcat_core::transport::Transport;
use kwdcat_transport::{LineConfig, SerialTransport};

use crate::query::QueryConfig;
use crate::session::Session;

/// Fluent builder for [`Session`].
///
/// Defaults: 57600 baud 8N1, DTR and RTS asserted, 100 ms settle interval,
/// 1 s power-on delay, receive timeout taken from the line configuration.
pub struct SessionBuilder {
    serial_port: Option<String>,
    line: LineConfig,
    settle_interval: Duration,
    power_on_delay: Duration,
    receive_timeout: Option<Duration>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        let defaults = QueryConfig::default();
        SessionBuilder {
            serial_port: None,
            line: LineConfig::default(),
            settle_interval: defaults.settle_interval,
            power_on_delay: defaults.power_on_delay,
            receive_timeout: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Replace the whole serial line configuration.
    pub fn line_config(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    /// Override the baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.line.baud_rate = baud;
        self
    }

    /// Delay between a request and reading its reply (default: 100ms).
    pub fn settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    /// Delay after the power-on command before re-checking (default: 1s).
    pub fn power_on_delay(mut self, delay: Duration) -> Self {
        self.power_on_delay = delay;
        self
    }

    /// Deadline for each receive while reading a reply. Overrides the line
    /// configuration's `rx_timeout`.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    fn query_config(&self) -> QueryConfig {
        QueryConfig {
            settle_interval: self.settle_interval,
            power_on_delay: self.power_on_delay,
            receive_timeout: self.receive_timeout.unwrap_or(self.line.rx_timeout),
        }
    }

    /// Build a [`Session`] with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `kwdcat-test-harness`) and for callers who manage the transport
    /// lifecycle themselves.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Session {
        Session::new(transport, self.query_config())
    }

    /// Open the serial port and build a [`Session`] on it.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<Session> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = SerialTransport::open_with_config(port, &self.line).await?;
        Ok(self.build_with_transport(Box::new(transport)))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
