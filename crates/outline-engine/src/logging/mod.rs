//! Logging utilities.
//!
//! This module centralizes logger initialization. Everything else in the
//! crate reports through the `log` facade: program build diagnostics, device
//! allocation failures and context setup.

mod init;

pub use init::{init_logging, LoggingConfig};
