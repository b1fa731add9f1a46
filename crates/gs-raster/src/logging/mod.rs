//! Logging utilities.
//!
//! Centralizes logger initialization. Library code only talks to the `log` facade;
//! binaries and tests decide whether `env_logger` is installed.

mod init;

pub use init::{init_logging, LoggingConfig};
