//! Kenwood CAT driver: request/reply engine and frame decoders.
//!
//! This crate talks the Kenwood CAT (Computer Aided Transceiver) protocol:
//! short ASCII commands terminated by `;`, answered by `;`-terminated
//! replies. It provides:
//!
//! - **Protocol framing** ([`protocol`]) -- request encoding.
//! - **Query engine** ([`query`]) -- one transaction: discard stale input,
//!   send, settle, read, and pick out the reply that belongs to the request
//!   even if other programs share the port.
//! - **Frame codec** ([`frames`], [`mode`]) -- strict decoders for the `IF`,
//!   `FA`/`FB`, `XI` and `PC` reply frames and the mode-code table.
//! - **Command builders** ([`commands`]) -- request text for every operation.
//! - **Session** ([`session`], [`builder`]) -- an open connection with typed
//!   reads, a power-on liveness check, and fire-and-forget controls.
//!
//! # Example
//!
//! ```
//! use kwdcat::query::locate_reply;
//! use kwdcat::frames::StatusFrame;
//!
//! // Bytes read after sending `IF;` on a port shared with a logger that
//! // just asked for VFO B.
//! let raw = "FB00007000000;IF00014050380      040000041020000080;";
//! let reply = locate_reply(raw, "IF", StatusFrame::LEN).unwrap();
//! let status = StatusFrame::decode(reply).unwrap();
//! assert_eq!(status.frequency, "14.050380");
//! ```

pub mod builder;
pub mod commands;
pub mod frames;
pub mod mode;
pub mod protocol;
pub mod query;
pub mod session;

// Re-export the primary types for ergonomic `use kwdcat::*`.
pub use builder::SessionBuilder;
pub use commands::{Direction, Vfo};
pub use frames::{Frame, InfoFrame, PowerFrame, StatusFrame, VfoFrequencyFrame};
pub use kwdcat_core::{Error, Result, Transport};
pub use mode::ModeName;
pub use query::QueryConfig;
pub use session::{DeviceState, Session};
