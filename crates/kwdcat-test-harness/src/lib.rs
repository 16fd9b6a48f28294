//! kwdcat-test-harness: test utilities for kwdcat.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! CAT query engine without a real transceiver attached.

pub mod mock_serial;

pub use mock_serial::MockTransport;
