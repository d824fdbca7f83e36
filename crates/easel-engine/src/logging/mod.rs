//! Logging utilities.
//!
//! Centralizes logger initialization. The library itself only uses the
//! `log` facade; the `env_logger` backend is wired up here for hosts that
//! do not bring their own.

mod init;

pub use init::{init_logging, LoggingConfig};
