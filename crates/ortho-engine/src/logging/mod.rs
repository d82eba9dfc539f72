//! Logging setup.
//!
//! The engine logs through the `log` facade only; `init_logging` installs the
//! `env_logger` backend for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
