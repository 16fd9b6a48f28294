//! kwdcat-core: error definitions and the transport trait for kwdcat.
//!
//! These types are shared by the serial transport, the mock transport in
//! the test harness, and the CAT engine itself.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;

pub use error::{Error, Result};
pub use transport::Transport;
