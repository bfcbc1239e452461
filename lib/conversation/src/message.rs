//! Message types for conversations.
//!
//! The history of a session is an ordered list of [`Message`]s. Its order
//! is the literal context sent to the completion backend, so messages are
//! only ever appended.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Fixed instructions set at session creation.
    System,
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// Tool result message.
    Tool,
}

/// A message in a conversation, tagged by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// Instructional content, set once.
    System {
        /// The system prompt.
        content: String,
    },
    /// Content supplied by the client.
    User {
        /// The user's text.
        content: String,
    },
    /// A completion backend turn.
    Assistant {
        /// Natural-language text, if the model produced any.
        content: Option<String>,
        /// Tool calls requested by the model.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The result of one tool call.
    Tool {
        /// The [`ToolCall::id`] this result answers.
        tool_call_id: String,
        /// The result payload, forwarded verbatim to the model.
        result: JsonValue,
    },
}

impl Message {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, result: JsonValue) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            result,
        }
    }

    /// Returns the role of this message.
    #[must_use]
    pub fn role(&self) -> MessageRole {
        match self {
            Self::System { .. } => MessageRole::System,
            Self::User { .. } => MessageRole::User,
            Self::Assistant { .. } => MessageRole::Assistant,
            Self::Tool { .. } => MessageRole::Tool,
        }
    }

    /// Returns the tool calls carried by an assistant message.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

impl From<AssistantTurn> for Message {
    fn from(turn: AssistantTurn) -> Self {
        Self::Assistant {
            content: turn.content,
            tool_calls: turn.tool_calls,
        }
    }
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation identifier assigned by the completion backend.
    pub id: String,
    /// The tool name.
    pub name: String,
    /// Raw JSON arguments, exactly as the model produced them. May be malformed.
    pub arguments: String,
}

impl ToolCall {
    /// Creates a new tool call.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One response from the completion backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantTurn {
    /// Natural-language text, if any.
    pub content: Option<String>,
    /// Zero or more tool calls, in the order the model issued them.
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// Creates a plain-text turn with no tool calls.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Creates a turn that requests tool calls.
    #[must_use]
    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content,
            tool_calls,
        }
    }

    /// Returns true if the model asked for tools to be run.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
