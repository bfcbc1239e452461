//! Query classification and routing.
//!
//! Classification is keyword containment, not parsing. Matching is
//! case-insensitive and ignores word boundaries, so a read query whose
//! string literal contains the word "insert" is classified as a write.
//! That false positive is accepted.

use crate::connector::DataAccessBackend;
use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const READ_KEYWORD: &str = "SELECT";
const WRITE_KEYWORDS: [&str; 3] = ["INSERT", "UPDATE", "DELETE"];

/// Which data-access endpoint a query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Read query, sent to the query endpoint.
    Read,
    /// Write statement, sent to the mutate endpoint.
    Write,
}

impl QueryKind {
    /// Path segment of the endpoint under the backend base URL.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Read => "query",
            Self::Write => "mutate",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Classifies a raw query string.
///
/// Any write keyword wins over `SELECT`, so `INSERT ... SELECT` is a write.
///
/// # Errors
///
/// Returns [`QueryError::InvalidQueryKind`] if no keyword is present.
pub fn classify(query: &str) -> Result<QueryKind, QueryError> {
    let upper = query.to_uppercase();
    if WRITE_KEYWORDS.iter().any(|keyword| upper.contains(keyword)) {
        Ok(QueryKind::Write)
    } else if upper.contains(READ_KEYWORD) {
        Ok(QueryKind::Read)
    } else {
        Err(QueryError::InvalidQueryKind)
    }
}

/// Routes queries to the data-access backend.
///
/// Every outcome is a JSON value: failures become `{"error": "..."}` so a
/// single bad query never aborts the conversation loop.
#[derive(Clone)]
pub struct QueryRouter {
    backend: Arc<dyn DataAccessBackend>,
}

impl QueryRouter {
    /// Creates a router over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn DataAccessBackend>) -> Self {
        Self { backend }
    }

    /// Classifies the query and sends it to the matching endpoint.
    pub async fn classify_and_dispatch(&self, query: &str) -> JsonValue {
        let kind = match classify(query) {
            Ok(kind) => kind,
            Err(e) => {
                debug!(error = %e, "Query classification failed");
                return error_payload(&e);
            }
        };

        match self.backend.execute(kind, query).await {
            Ok(payload) => {
                debug!(kind = %kind, "Query executed");
                payload
            }
            Err(e) => {
                warn!(error = %e, kind = %kind, "Data access request failed");
                error_payload(&e)
            }
        }
    }
}

impl fmt::Debug for QueryRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRouter").finish_non_exhaustive()
    }
}

fn error_payload(error: &dyn std::error::Error) -> JsonValue {
    serde_json::json!({ "error": error.to_string() })
}
