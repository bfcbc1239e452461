//! Error types for the AI crate.
//!
//! - `LlmError`: Completion backend failures. These end the whole turn.
//! - `DispatchError`: Rejected tool calls. These abandon the current
//!   tool-call batch but the loop continues.
//! - `CoordinateError`: Terminal loop failures reported to the client.

use queryline_conversation::ToolName;
use std::fmt;

/// Errors from completion backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Request failed before a response arrived.
    RequestFailed { reason: String },
    /// The backend answered with a non-2xx status.
    HttpStatus { status: u16, body: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::HttpStatus { status, body } => {
                write!(f, "LLM backend returned HTTP {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Reasons a tool call is rejected before reaching the data-access backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The arguments are not a JSON object.
    InvalidArguments { reason: String },
    /// The arguments carry no non-empty `query` string.
    MissingQuery,
    /// The query shape is not allowed for the named tool.
    PolicyViolation { tool: ToolName },
    /// The model named a tool outside the catalog.
    UnknownTool { name: String },
}

impl DispatchError {
    /// The text shown to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidArguments { .. } => "Invalid tool call arguments.".to_string(),
            Self::MissingQuery => "Tool call is missing a query.".to_string(),
            Self::PolicyViolation {
                tool: ToolName::RunSqlQuery,
            } => "run_sql_query only accepts SELECT queries.".to_string(),
            Self::PolicyViolation {
                tool: ToolName::RunSqlMutation,
            } => "run_sql_mutation only accepts INSERT, UPDATE or DELETE statements.".to_string(),
            Self::UnknownTool { name } => format!("Unknown tool: {name}"),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments { reason } => {
                write!(f, "invalid tool call arguments: {reason}")
            }
            Self::MissingQuery => write!(f, "tool call is missing a query"),
            Self::PolicyViolation { tool } => {
                write!(f, "query shape not allowed for tool '{tool}'")
            }
            Self::UnknownTool { name } => write!(f, "unknown tool: {name}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Terminal failures of one orchestration loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    /// The completion backend failed.
    Backend(LlmError),
    /// The iteration ceiling was reached without a final answer.
    MaxIterationsReached { max: u32 },
}

impl CoordinateError {
    /// The text shown to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Backend(e) => format!("Completion request failed: {e}"),
            Self::MaxIterationsReached { max } => {
                format!("Reached the maximum of {max} tool iterations without a final answer.")
            }
        }
    }
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "completion backend failed: {e}"),
            Self::MaxIterationsReached { max } => {
                write!(f, "exceeded {max} iterations without a final answer")
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

impl From<LlmError> for CoordinateError {
    fn from(e: LlmError) -> Self {
        Self::Backend(e)
    }
}
