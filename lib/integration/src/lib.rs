//! Data-access integration for the queryline gateway.
//!
//! This crate provides:
//!
//! - **Query Router**: Keyword classification of raw SQL and dispatch to
//!   the matching endpoint
//! - **Connector**: The data-access backend interface and its HTTP
//!   implementation

pub mod connector;
pub mod error;
pub mod query;

pub use connector::{DataAccessBackend, DataAccessConfig, HttpDataAccess};
pub use error::{ConnectorError, QueryError};
pub use query::{QueryKind, QueryRouter, classify};
