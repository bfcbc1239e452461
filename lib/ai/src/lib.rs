//! Model-facing side of the queryline gateway.
//!
//! This crate provides:
//!
//! - **Completion Client**: One request/response exchange with a
//!   chat-completion backend
//! - **Tool Dispatcher**: Validates model-issued tool calls and runs them
//!   against the data-access backend
//! - **Coordinator**: The bounded completion and tool-dispatch loop that
//!   handles one user message

pub mod backend;
pub mod coordinate;
pub mod dispatch;
pub mod error;

pub use backend::{CompletionBackend, CompletionConfig, OpenAiCompletionClient};
pub use coordinate::{Coordinator, MAX_ITERATIONS, TurnOutcome};
pub use dispatch::{BatchOutcome, ToolDispatcher, ToolInvocation};
pub use error::{CoordinateError, DispatchError, LlmError};
