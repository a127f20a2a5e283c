//! Logging utilities.
//!
//! Logger initialization lives here; the rest of the crate only talks to the
//! `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig};
