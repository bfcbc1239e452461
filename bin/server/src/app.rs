//! HTTP routes.

use crate::state::AppState;
use crate::ws::ws_handler;
use axum::{Json, Router, routing::get};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use futures::{SinkExt, StreamExt};
    use queryline_ai::{CompletionBackend, Coordinator, LlmError, ToolDispatcher};
    use queryline_conversation::{
        AssistantTurn, InMemorySessionStore, Message, ToolCall, ToolCatalog,
    };
    use queryline_integration::{ConnectorError, DataAccessBackend, QueryKind, QueryRouter};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::Notify;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
    use tower::ServiceExt;

    type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Asks for one read query, then answers once its result is in the
    /// history.
    struct PackagesCompletion;

    #[async_trait]
    impl CompletionBackend for PackagesCompletion {
        async fn complete(
            &self,
            history: &[Message],
            _tools: &ToolCatalog,
        ) -> Result<AssistantTurn, LlmError> {
            match history.last() {
                Some(Message::Tool { .. }) => Ok(AssistantTurn::text("serde, tokio")),
                _ => Ok(AssistantTurn::with_tool_calls(
                    None,
                    vec![ToolCall::new(
                        "call_1",
                        "run_sql_query",
                        r#"{"query":"SELECT name FROM packages"}"#,
                    )],
                )),
            }
        }
    }

    /// Blocks every completion until the gate is opened.
    #[derive(Default)]
    struct GatedCompletion {
        gate: Notify,
    }

    #[async_trait]
    impl CompletionBackend for GatedCompletion {
        async fn complete(
            &self,
            _history: &[Message],
            _tools: &ToolCatalog,
        ) -> Result<AssistantTurn, LlmError> {
            self.gate.notified().await;
            Ok(AssistantTurn::text("done"))
        }
    }

    struct StaticData;

    #[async_trait]
    impl DataAccessBackend for StaticData {
        async fn execute(&self, _kind: QueryKind, _query: &str) -> Result<JsonValue, ConnectorError> {
            Ok(json!({"rows": [{"name": "serde"}, {"name": "tokio"}]}))
        }
    }

    fn test_state(
        completion: Arc<dyn CompletionBackend>,
        store: Arc<InMemorySessionStore>,
    ) -> Arc<AppState> {
        let coordinator = Coordinator::new(
            completion,
            ToolDispatcher::new(QueryRouter::new(Arc::new(StaticData))),
            ToolCatalog::sql(),
        );
        Arc::new(AppState::new(store, coordinator, "You answer package questions."))
    }

    async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.expect("serve");
        });
        addr
    }

    async fn connect(addr: SocketAddr) -> ClientSocket {
        let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("connect");
        socket
    }

    async fn send(socket: &mut ClientSocket, text: &str) {
        socket
            .send(ClientMessage::Text(text.into()))
            .await
            .expect("send");
    }

    async fn next_frame(socket: &mut ClientSocket) -> JsonValue {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("frame before timeout")
                .expect("socket open")
                .expect("valid frame");
            if let ClientMessage::Text(text) = message {
                return serde_json::from_str(text.as_str()).expect("JSON frame");
            }
        }
    }

    async fn wait_for_sessions(store: &InMemorySessionStore, expected: usize) {
        for _ in 0..100 {
            if store.len().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {expected} live sessions, found {}", store.len().await);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = test_state(Arc::new(PackagesCompletion), Arc::default());

        let response = router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: JsonValue = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn plain_get_on_ws_is_rejected() {
        let state = test_state(Arc::new(PackagesCompletion), Arc::default());

        let response = router(state)
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn tool_round_trip_over_websocket() {
        let addr = spawn_server(test_state(Arc::new(PackagesCompletion), Arc::default())).await;
        let mut socket = connect(addr).await;

        send(&mut socket, r#"{"message":"list all packages"}"#).await;

        assert_eq!(
            next_frame(&mut socket).await,
            json!({"progress": "Running SQL query: SELECT name FROM packages"})
        );
        assert_eq!(
            next_frame(&mut socket).await,
            json!({"response": "serde, tokio"})
        );
    }

    #[tokio::test]
    async fn malformed_frames_get_error() {
        let addr = spawn_server(test_state(Arc::new(PackagesCompletion), Arc::default())).await;
        let mut socket = connect(addr).await;

        for frame in ["not json", r#"{"text":"hi"}"#, r#"{"message":""}"#] {
            send(&mut socket, frame).await;
            assert_eq!(
                next_frame(&mut socket).await,
                json!({"error": "No message content provided."}),
                "frame: {frame}"
            );
        }
    }

    #[tokio::test]
    async fn second_message_while_busy_is_rejected() {
        let completion = Arc::new(GatedCompletion::default());
        let addr = spawn_server(test_state(completion.clone(), Arc::default())).await;
        let mut socket = connect(addr).await;

        send(&mut socket, r#"{"message":"first"}"#).await;
        send(&mut socket, r#"{"message":"second"}"#).await;

        assert_eq!(
            next_frame(&mut socket).await,
            json!({"error": "Processing previous message, please wait."})
        );

        completion.gate.notify_one();
        assert_eq!(next_frame(&mut socket).await, json!({"response": "done"}));

        // Idle again: the next message starts a new turn.
        send(&mut socket, r#"{"message":"third"}"#).await;
        completion.gate.notify_one();
        assert_eq!(next_frame(&mut socket).await, json!({"response": "done"}));
    }

    #[tokio::test]
    async fn close_deletes_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let completion = Arc::new(GatedCompletion::default());
        let addr = spawn_server(test_state(completion, store.clone())).await;

        let mut socket = connect(addr).await;
        wait_for_sessions(&store, 1).await;

        // Leave a turn in flight; closing must not wait for it.
        send(&mut socket, r#"{"message":"never answered"}"#).await;
        socket.close(None).await.expect("close");

        wait_for_sessions(&store, 0).await;
    }
}
