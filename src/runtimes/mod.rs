//! Session layer: the only part of the crate that touches async I/O.
//!
//! [`TelemetryClient`] is the transport seam implemented outside this
//! crate; [`RunSession`] drives it and publishes immutable snapshots for
//! the pure resolution core to consume.

pub mod client;
pub mod session;

pub use client::{TelemetryClient, TelemetryError};
pub use session::{RunSession, SessionConfig, SessionError};
