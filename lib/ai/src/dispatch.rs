//! Tool call validation and dispatch.
//!
//! A model-issued [`ToolCall`] is validated into a [`ToolInvocation`]
//! before anything reaches the data-access backend. Each tool is bound
//! to a query shape: `run_sql_query` only runs reads and
//! `run_sql_mutation` only runs writes.

use crate::error::DispatchError;
use queryline_conversation::{ClientEvent, EventSink, Message, ToolCall, ToolName};
use queryline_integration::{QueryKind, QueryRouter, classify};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// A validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    /// Run a read query.
    RunSqlQuery { query: String },
    /// Run a write statement.
    RunSqlMutation { query: String },
}

impl ToolInvocation {
    /// Validates a raw tool call.
    ///
    /// Checks run in order: arguments are a JSON object, `query` is a
    /// non-empty string, the tool is known, the query shape matches the tool.
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn parse(call: &ToolCall) -> Result<Self, DispatchError> {
        let arguments: JsonValue =
            serde_json::from_str(&call.arguments).map_err(|e| DispatchError::InvalidArguments {
                reason: e.to_string(),
            })?;
        if !arguments.is_object() {
            return Err(DispatchError::InvalidArguments {
                reason: "arguments must be a JSON object".to_string(),
            });
        }

        let query = arguments
            .get("query")
            .and_then(JsonValue::as_str)
            .filter(|query| !query.trim().is_empty())
            .ok_or(DispatchError::MissingQuery)?
            .to_string();

        let tool = ToolName::from_name(&call.name).ok_or_else(|| DispatchError::UnknownTool {
            name: call.name.clone(),
        })?;

        let required = match tool {
            ToolName::RunSqlQuery => QueryKind::Read,
            ToolName::RunSqlMutation => QueryKind::Write,
        };
        if classify(&query) != Ok(required) {
            return Err(DispatchError::PolicyViolation { tool });
        }

        Ok(match tool {
            ToolName::RunSqlQuery => Self::RunSqlQuery { query },
            ToolName::RunSqlMutation => Self::RunSqlMutation { query },
        })
    }

    /// Returns the tool being invoked.
    #[must_use]
    pub fn tool(&self) -> ToolName {
        match self {
            Self::RunSqlQuery { .. } => ToolName::RunSqlQuery,
            Self::RunSqlMutation { .. } => ToolName::RunSqlMutation,
        }
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn query(&self) -> &str {
        match self {
            Self::RunSqlQuery { query } | Self::RunSqlMutation { query } => query,
        }
    }

    /// Progress text used when the model gave no accompanying content.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::RunSqlQuery { query } => format!("Running SQL query: {query}"),
            Self::RunSqlMutation { query } => format!("Running SQL mutation: {query}"),
        }
    }
}

/// Outcome of dispatching one assistant turn's tool calls.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// One `tool` message per call in the batch, in call order.
    pub messages: Vec<Message>,
    /// Number of calls that reached the data-access backend.
    pub dispatched: usize,
    /// The rejection that abandoned the batch, if any.
    pub rejection: Option<DispatchError>,
}

/// Executes validated tool calls through the query router.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    router: QueryRouter,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given router.
    #[must_use]
    pub fn new(router: QueryRouter) -> Self {
        Self { router }
    }

    /// Validates and runs one tool call.
    ///
    /// Emits a progress frame before the backend is called. The returned
    /// message wraps the router's result even when that result is an
    /// `{"error": ...}` payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the call is rejected; the backend is
    /// not contacted in that case.
    pub async fn execute(
        &self,
        call: &ToolCall,
        progress: Option<&str>,
        events: &EventSink,
    ) -> Result<Message, DispatchError> {
        let invocation = ToolInvocation::parse(call)?;

        let text = progress
            .filter(|text| !text.trim().is_empty())
            .map_or_else(|| invocation.describe(), str::to_string);
        events.emit(ClientEvent::Progress(text)).await;

        debug!(tool = %invocation.tool(), call_id = %call.id, "Dispatching tool call");
        let result = self.router.classify_and_dispatch(invocation.query()).await;
        Ok(Message::tool(&call.id, result))
    }

    /// Runs a batch of tool calls in order, stopping at the first rejection.
    ///
    /// The rejection is reported to the client. The rejected call and every
    /// call after it still get a `tool` message carrying an error payload,
    /// so each call in the assistant message is answered.
    pub async fn dispatch_batch(
        &self,
        content: Option<&str>,
        calls: &[ToolCall],
        events: &EventSink,
    ) -> BatchOutcome {
        let mut messages = Vec::with_capacity(calls.len());
        let mut progress = content;

        for (index, call) in calls.iter().enumerate() {
            match self.execute(call, progress.take(), events).await {
                Ok(message) => messages.push(message),
                Err(e) => {
                    warn!(error = %e, tool = %call.name, call_id = %call.id, "Tool call rejected");
                    events.emit(ClientEvent::error(e.client_message())).await;

                    messages.push(Message::tool(
                        &call.id,
                        serde_json::json!({ "error": e.to_string() }),
                    ));
                    messages.extend(calls[index + 1..].iter().map(|skipped| {
                        Message::tool(
                            &skipped.id,
                            serde_json::json!({
                                "error": "skipped: an earlier tool call in this batch was rejected"
                            }),
                        )
                    }));

                    return BatchOutcome {
                        messages,
                        dispatched: index,
                        rejection: Some(e),
                    };
                }
            }
        }

        BatchOutcome {
            dispatched: messages.len(),
            messages,
            rejection: None,
        }
    }
}
