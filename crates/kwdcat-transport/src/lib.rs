//! Transport implementations for kwdcat.
//!
//! This crate provides [`SerialTransport`], the concrete implementation of
//! the [`Transport`](kwdcat_core::Transport) trait for USB virtual COM
//! ports and RS-232 serial connections, along with the [`LineConfig`] used
//! to open it and [`available_ports`] for port discovery.

pub mod serial;

pub use serial::{
    DataBits, FlowControl, LineConfig, Parity, PortInfo, SerialTransport, StopBits,
    available_ports,
};
