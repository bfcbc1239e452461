//! Conversation model for the queryline gateway.
//!
//! This crate provides:
//!
//! - **Messages**: The role-tagged history sent to the completion backend
//! - **Sessions**: Per-connection history and busy flag, plus the store
//! - **Tool Catalog**: The tools the model may call
//! - **Client Frames**: The JSON frames exchanged with the client

pub mod error;
pub mod event;
pub mod message;
pub mod session;
pub mod store;
pub mod tool;

pub use error::SessionError;
pub use event::{ClientEvent, EventSink, parse_inbound};
pub use message::{AssistantTurn, Message, MessageRole, ToolCall};
pub use session::{Session, TurnGuard};
pub use store::{InMemorySessionStore, SessionStore};
pub use tool::{ToolCatalog, ToolDefinition, ToolName};
