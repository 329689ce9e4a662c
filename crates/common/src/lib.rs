//! Common utilities for mobdev
//!
//! Shared pieces between the daemon and the control tool: error handling
//! and logging setup, plus the default control-socket location both sides
//! must agree on.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::setup_logging;

/// Default control-socket path claimed by the daemon.
pub const DEFAULT_SOCKET_PATH: &str = "/run/mobdev.sock";
