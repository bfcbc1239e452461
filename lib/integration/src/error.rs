//! Error types for the integration crate.
//!
//! - `ConnectorError`: Errors from data-access backend calls
//! - `QueryError`: Errors from query classification
//!
//! Neither reaches the client as a fault. The router folds both into an
//! `{"error": ...}` payload that the model sees as a tool result.

use std::fmt;

/// Errors from data-access backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Connection to the backend failed.
    ConnectionFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// The backend answered with a non-2xx status.
    HttpStatus { status: u16, body: String },
    /// The response body was not valid JSON.
    InvalidResponse { reason: String },
    /// The client could not be configured.
    InvalidConfig { reason: String },
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::Timeout => write!(f, "data access request timed out"),
            Self::HttpStatus { status, body } => {
                write!(f, "data access backend returned HTTP {status}: {body}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid data access response: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid data access configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for ConnectorError {}

/// Errors from query classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query contains none of the recognised keywords.
    InvalidQueryKind,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQueryKind => write!(
                f,
                "invalid query type: expected SELECT, INSERT, UPDATE or DELETE"
            ),
        }
    }
}

impl std::error::Error for QueryError {}
