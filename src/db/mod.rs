//! Database access layer.
//!
//! This module provides:
//! - The pool wrapper with readiness probes
//! - Reserved connections and the full operation set on them
//! - Transaction coordination
//! - Statement execution, parameter binding and row decoding

pub mod connection;
pub mod executor;
#[macro_use]
mod macros;
pub mod params;
pub mod pool;
pub mod transaction;
pub mod types;

pub use connection::{Connection, ConnectionState};
pub use pool::{DEFAULT_READY_TIMEOUT, DEFAULT_WAIT_RETRIES, Mysql, READY_INTERVAL};
pub use types::DecodeOptions;
