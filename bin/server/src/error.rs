//! Domain error types for server startup.
//!
//! Per-connection failures never surface here: they are reported to the
//! client as error frames and logged.

use std::fmt;

/// Errors that stop the server from starting.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration is missing or invalid.
    Config { reason: String },
    /// A backend client could not be constructed.
    Backend { reason: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "invalid configuration: {reason}"),
            Self::Backend { reason } => {
                write!(f, "failed to initialize backend client: {reason}")
            }
        }
    }
}

impl std::error::Error for ServerError {}
