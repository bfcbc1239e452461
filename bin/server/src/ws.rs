//! Per-connection WebSocket handler.
//!
//! Each connection owns one session. The receive loop never waits on a
//! turn: accepted messages are spawned onto a per-connection task set and
//! a message arriving while a turn is running is rejected on the spot.
//! Outbound frames from every task funnel through one channel drained by
//! a writer task, so only the writer touches the socket.

use crate::state::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use queryline_conversation::{ClientEvent, EventSink, Session, event, parse_inbound};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Outbound frames buffered per connection before senders wait.
const OUTBOUND_BUFFER: usize = 64;

/// Upgrades `GET /ws` to a WebSocket connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let session = match state.store.create(&state.system_prompt).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Failed to create session");
            return;
        }
    };
    let session_id = session.id();
    info!(session_id = %session_id, "Client connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ClientEvent>(OUTBOUND_BUFFER);
    let events = EventSink::new(tx);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode outbound frame");
                    continue;
                }
            };
            if let Err(e) = sender.send(WsMessage::Text(text.into())).await {
                debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    let mut turns = JoinSet::new();
    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(WsMessage::Text(text)) => text.as_str().to_owned(),
            Ok(WsMessage::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    events
                        .emit(ClientEvent::error(event::NO_MESSAGE_CONTENT))
                        .await;
                    continue;
                }
            },
            // Pongs are sent by the protocol layer.
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => continue,
            Ok(WsMessage::Close(_)) => break,
            Err(e) => {
                debug!(error = %e, "WebSocket receive error");
                break;
            }
        };

        while turns.try_join_next().is_some() {}
        accept_message(&state, &session, &text, &events, &mut turns).await;
    }

    // In-flight turns are abandoned, not drained.
    turns.abort_all();
    if let Err(e) = state.store.delete(session_id).await {
        warn!(error = %e, session_id = %session_id, "Failed to delete session");
    }
    drop(events);
    writer.abort();
    info!(
        session_id = %session_id,
        age_ms = session.age().num_milliseconds(),
        "Client disconnected"
    );
}

/// Validates one inbound frame and starts a turn for it.
async fn accept_message(
    state: &Arc<AppState>,
    session: &Arc<Session>,
    text: &str,
    events: &EventSink,
    turns: &mut JoinSet<()>,
) {
    let Some(message) = parse_inbound(text) else {
        events
            .emit(ClientEvent::error(event::NO_MESSAGE_CONTENT))
            .await;
        return;
    };

    let Some(guard) = session.try_begin_turn() else {
        debug!(session_id = %session.id(), "Rejected message while busy");
        events.emit(ClientEvent::error(event::BUSY)).await;
        return;
    };

    let coordinator = Arc::clone(&state.coordinator);
    let events = events.clone();
    turns.spawn(async move {
        coordinator.run_turn(guard, message, events).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use queryline_ai::{CompletionBackend, Coordinator, LlmError, ToolDispatcher};
    use queryline_conversation::{AssistantTurn, InMemorySessionStore, Message, ToolCatalog};
    use queryline_integration::{ConnectorError, DataAccessBackend, QueryKind, QueryRouter};
    use serde_json::Value as JsonValue;

    struct Echo;

    #[async_trait]
    impl CompletionBackend for Echo {
        async fn complete(
            &self,
            _history: &[Message],
            _tools: &ToolCatalog,
        ) -> Result<AssistantTurn, LlmError> {
            Ok(AssistantTurn::text("ok"))
        }
    }

    struct NoData;

    #[async_trait]
    impl DataAccessBackend for NoData {
        async fn execute(&self, _kind: QueryKind, _query: &str) -> Result<JsonValue, ConnectorError> {
            Ok(JsonValue::Null)
        }
    }

    fn state() -> Arc<AppState> {
        let coordinator = Coordinator::new(
            Arc::new(Echo),
            ToolDispatcher::new(QueryRouter::new(Arc::new(NoData))),
            ToolCatalog::sql(),
        );
        Arc::new(AppState::new(
            Arc::new(InMemorySessionStore::new()),
            coordinator,
            "sys",
        ))
    }

    async fn accept(session: &Arc<Session>, text: &str) -> (Vec<ClientEvent>, JoinSet<()>) {
        let (tx, mut rx) = mpsc::channel(8);
        let events = EventSink::new(tx);
        let mut turns = JoinSet::new();

        accept_message(&state(), session, text, &events, &mut turns).await;
        drop(events);

        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        (frames, turns)
    }

    #[tokio::test]
    async fn busy_session_rejects_without_touching_history() {
        let session = Arc::new(Session::new("sys"));
        session.append(Message::user("first")).await;
        let _guard = session.try_begin_turn().expect("session idle");

        let (frames, turns) = accept(&session, r#"{"message":"second"}"#).await;

        assert_eq!(frames, vec![ClientEvent::error(event::BUSY)]);
        assert!(turns.is_empty());
        assert_eq!(session.message_count().await, 2);
        assert!(session.is_busy());
    }

    #[tokio::test]
    async fn missing_message_is_rejected_before_busy_check() {
        let session = Arc::new(Session::new("sys"));

        let (frames, turns) = accept(&session, r#"{"message":""}"#).await;

        assert_eq!(frames, vec![ClientEvent::error(event::NO_MESSAGE_CONTENT)]);
        assert!(turns.is_empty());
        assert!(!session.is_busy());
        assert_eq!(session.message_count().await, 1);
    }

    #[tokio::test]
    async fn idle_session_starts_a_turn() {
        let session = Arc::new(Session::new("sys"));

        let (frames, mut turns) = accept(&session, r#"{"message":"hello"}"#).await;

        assert!(frames.is_empty());
        assert_eq!(turns.len(), 1);
        turns.join_next().await.expect("turn spawned").expect("turn finished");
        assert!(!session.is_busy());
        // system, user, assistant
        assert_eq!(session.message_count().await, 3);
    }
}
