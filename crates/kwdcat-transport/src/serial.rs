//! Serial port transport for CAT communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for USB virtual COM ports and physical RS-232
//! connections, plus [`available_ports`] for listing what the OS exposes.
//!
//! Kenwood HF rigs present a USB virtual COM port; the factory default on
//! most of them is 57600 or 115200 baud, 8N1.
//!
//! # Example
//!
//! ```no_run
//! use kwdcat_transport::{LineConfig, SerialTransport};
//! use kwdcat_core::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> kwdcat_core::Result<()> {
//! let config = LineConfig {
//!     baud_rate: 115_200,
//!     ..Default::default()
//! };
//! let mut transport = SerialTransport::open_with_config("/dev/ttyUSB0", &config).await?;
//!
//! transport.send(b"IF;").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_millis(500)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use kwdcat_core::error::{Error, Result};
use kwdcat_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

/// Serial line configuration.
///
/// Defaults match what a Kenwood rig expects out of the box over USB:
/// 57600 baud, 8 data bits, 1 stop bit, no parity, no flow control, with
/// DTR and RTS both asserted once the port is open.
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Baud rate (e.g. 9600, 38400, 57600, 115200)
    pub baud_rate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Number of stop bits (typically 1)
    pub stop_bits: StopBits,
    /// Parity checking (typically None)
    pub parity: Parity,
    /// Flow control (typically None)
    pub flow_control: FlowControl,
    /// Level to drive DTR to after opening.
    pub dtr: bool,
    /// Level to drive RTS to after opening.
    pub rts: bool,
    /// Deadline for a single receive. `Duration::ZERO` polls without waiting.
    pub rx_timeout: Duration,
    /// Deadline for a single send. `Duration::ZERO` disables the deadline.
    pub tx_timeout: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud_rate: 57_600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            dtr: true,
            rts: true,
            rx_timeout: Duration::from_millis(500),
            tx_timeout: Duration::ZERO,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => tokio_serial::DataBits::Five,
            DataBits::Six => tokio_serial::DataBits::Six,
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}

/// A serial port reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Path or name used to open the port (e.g. `/dev/ttyUSB0`, `COM3`).
    pub name: String,
    /// Human-readable description, when the OS provides one.
    pub description: String,
}

/// List the serial ports currently visible to the OS, sorted by name.
///
/// Some virtual port drivers only create their ports on demand, so a port
/// missing from this list may still open.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| Error::TransportOpen(format!("failed to enumerate serial ports: {e}")))?;

    let mut infos: Vec<PortInfo> = ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                tokio_serial::SerialPortType::UsbPort(usb) => {
                    let product = usb.product.unwrap_or_default();
                    let maker = usb.manufacturer.unwrap_or_default();
                    format!("USB {:04x}:{:04x} {maker} {product}", usb.vid, usb.pid)
                        .trim()
                        .to_string()
                }
                tokio_serial::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                tokio_serial::SerialPortType::PciPort => "PCI".to_string(),
                tokio_serial::SerialPortType::Unknown => String::new(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(infos)
}

/// Serial port transport.
///
/// Implements the [`Transport`] trait for USB virtual COM ports and
/// physical RS-232 connections to transceivers.
pub struct SerialTransport {
    /// The underlying serial port stream
    port: Option<SerialStream>,
    /// Port name for logging/debugging
    port_name: String,
    /// Deadline applied to each send; zero means none.
    tx_timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (e.g., 9600, 57600, 115200)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = LineConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, &config).await
    }

    /// Open a serial port with full line configuration.
    pub async fn open_with_config(port: &str, config: &LineConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            dtr = config.dtr,
            rts = config.rts,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::TransportOpen(format!("{port}: {e}"))
            })?;

        let mut transport = Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
            tx_timeout: config.tx_timeout,
        };

        // Some rigs (and some USB interfaces) power their CAT level
        // converters from DTR/RTS, so drive both as configured.
        if let Err(e) = transport.set_dtr(config.dtr).await {
            tracing::warn!(port = %port, error = %e, "Failed to set DTR");
        }
        if let Err(e) = transport.set_rts(config.rts).await {
            tracing::warn!(port = %port, error = %e, "Failed to set RTS");
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(transport)
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = %String::from_utf8_lossy(data),
            "Sending data"
        );

        let write = async {
            port.write_all(data).await?;
            port.flush().await
        };

        let result = if self.tx_timeout.is_zero() {
            write.await
        } else {
            match tokio::time::timeout(self.tx_timeout, write).await {
                Ok(r) => r,
                Err(_) => Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "write timed out",
                )),
            }
        };

        result.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            Error::TransportWrite(e.to_string())
        })
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(0)) => Err(Error::TransportRead("serial port closed".into())),
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = %String::from_utf8_lossy(&buf[..n]),
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(Error::TransportRead(e.to_string()))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for data"
                );
                Err(Error::Timeout)
            }
        }
    }

    fn bytes_pending(&self) -> Result<usize> {
        let port = self.port.as_ref().ok_or(Error::NotConnected)?;
        port.bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| Error::TransportRead(e.to_string()))
    }

    fn discard_input(&mut self) -> Result<()> {
        let port = self.port.as_ref().ok_or(Error::NotConnected)?;
        port.clear(ClearBuffer::Input)
            .map_err(|e| Error::TransportRead(e.to_string()))
    }

    async fn set_dtr(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.write_data_terminal_ready(on)
            .map_err(|e| Error::TransportWrite(format!("failed to set DTR: {e}")))
    }

    async fn set_rts(&mut self, on: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.write_request_to_send(on)
            .map_err(|e| Error::TransportWrite(format!("failed to set RTS: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_config_default() {
        let config = LineConfig::default();
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::None);
        assert!(config.dtr);
        assert!(config.rts);
        assert_eq!(config.tx_timeout, Duration::ZERO);
    }

    #[test]
    fn test_enum_conversions() {
        assert_eq!(
            tokio_serial::DataBits::from(DataBits::Seven),
            tokio_serial::DataBits::Seven
        );
        assert_eq!(
            tokio_serial::StopBits::from(StopBits::Two),
            tokio_serial::StopBits::Two
        );
        assert_eq!(
            tokio_serial::Parity::from(Parity::Even),
            tokio_serial::Parity::Even
        );
        assert_eq!(
            tokio_serial::FlowControl::from(FlowControl::Hardware),
            tokio_serial::FlowControl::Hardware
        );
    }

    #[tokio::test]
    async fn test_open_missing_port_fails() {
        let result = SerialTransport::open("/dev/kwdcat-does-not-exist", 9600).await;
        assert!(matches!(result, Err(Error::TransportOpen(_))));
    }

    #[tokio::test]
    async fn test_control_lines_need_open_port() {
        let mut transport = SerialTransport {
            port: None,
            port_name: "closed".into(),
            tx_timeout: Duration::ZERO,
        };
        assert!(!transport.is_connected());
        assert!(matches!(transport.set_dtr(true).await, Err(Error::NotConnected)));
        assert!(matches!(transport.set_rts(true).await, Err(Error::NotConnected)));
    }
}
