//! Frames exchanged with the client over its connection.
//!
//! Inbound frames are `{"message": "..."}`. Outbound frames carry exactly
//! one of `progress`, `response` or `error`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Error text for an inbound frame without usable message content.
pub const NO_MESSAGE_CONTENT: &str = "No message content provided.";

/// Error text for a message received while a turn is running.
pub const BUSY: &str = "Processing previous message, please wait.";

/// An outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientEvent {
    /// Informational, zero or more per turn.
    Progress(String),
    /// Terminal success for the turn.
    Response(Option<String>),
    /// Terminal or turn-local failure notice.
    Error(String),
}

impl ClientEvent {
    /// Creates a progress frame.
    #[must_use]
    pub fn progress(text: impl Into<String>) -> Self {
        Self::Progress(text.into())
    }

    /// Creates an error frame.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(text.into())
    }
}

/// Outbound side of a client connection.
///
/// Sending never fails from the caller's point of view: once the
/// connection is gone, frames are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<ClientEvent>,
}

impl EventSink {
    /// Wraps the sending half of the connection's frame channel.
    #[must_use]
    pub fn new(tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }

    /// Queues a frame for the client.
    pub async fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("Client channel closed, dropping frame");
        }
    }
}

/// Extracts the user message from an inbound frame.
///
/// Returns `None` for anything that is not a JSON object with a non-empty
/// string `message` field.
#[must_use]
pub fn parse_inbound(text: &str) -> Option<String> {
    let frame: serde_json::Value = serde_json::from_str(text).ok()?;
    frame
        .get("message")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}
