//! Orchestration loop.
//!
//! One run of the loop handles one user message:
//! 1. Append the user message to the session history
//! 2. Ask the completion backend for the next assistant turn
//! 3. If the turn has no tool calls, send it to the client and stop
//! 4. Otherwise dispatch the tool calls, append their results, and repeat
//!
//! The loop is bounded by [`MAX_ITERATIONS`] completion round-trips.

use crate::backend::CompletionBackend;
use crate::dispatch::ToolDispatcher;
use crate::error::CoordinateError;
use queryline_conversation::{ClientEvent, EventSink, Message, ToolCatalog, TurnGuard};
use queryline_core::TurnId;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

/// Completion round-trips allowed per user message.
pub const MAX_ITERATIONS: u32 = 10;

/// How a loop run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Responded {
        /// The answer text, if any.
        content: Option<String>,
        /// Completion round-trips used.
        iterations: u32,
    },
    /// The run ended with an error frame.
    Failed(CoordinateError),
}

impl TurnOutcome {
    /// Returns true if the model produced a final answer.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Responded { .. })
    }
}

/// Drives the completion and tool-dispatch cycle for a session.
#[derive(Clone)]
pub struct Coordinator {
    completion: Arc<dyn CompletionBackend>,
    dispatcher: ToolDispatcher,
    catalog: Arc<ToolCatalog>,
    max_iterations: u32,
}

impl Coordinator {
    /// Creates a coordinator with the default iteration ceiling.
    #[must_use]
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        dispatcher: ToolDispatcher,
        catalog: ToolCatalog,
    ) -> Self {
        Self {
            completion,
            dispatcher,
            catalog: Arc::new(catalog),
            max_iterations: MAX_ITERATIONS,
        }
    }

    /// Sets the iteration ceiling.
    #[must_use]
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Runs one turn for the session held by `guard`.
    ///
    /// Every path ends with exactly one terminal frame on `events`: a
    /// `response` or an `error`. The guard is released just before that
    /// frame is sent.
    pub async fn run_turn(
        &self,
        guard: TurnGuard,
        user_text: String,
        events: EventSink,
    ) -> TurnOutcome {
        let turn_id = TurnId::new();
        let span = info_span!("turn", session_id = %guard.session().id(), turn_id = %turn_id);

        async move {
            let outcome = self.drive(&guard, user_text, &events).await;
            // The session is idle before the terminal frame is sent.
            drop(guard);
            match &outcome {
                TurnOutcome::Responded {
                    content,
                    iterations,
                } => {
                    info!(iterations, "Turn completed");
                    events.emit(ClientEvent::Response(content.clone())).await;
                }
                TurnOutcome::Failed(e) => {
                    warn!(error = %e, "Turn failed");
                    events.emit(ClientEvent::error(e.client_message())).await;
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, guard: &TurnGuard, user_text: String, events: &EventSink) -> TurnOutcome {
        let session = guard.session();
        session.append(Message::user(user_text)).await;

        for iteration in 1..=self.max_iterations {
            let history = session.history().await;
            let turn = match self.completion.complete(&history, &self.catalog).await {
                Ok(turn) => turn,
                Err(e) => return TurnOutcome::Failed(e.into()),
            };

            if !turn.has_tool_calls() {
                let content = turn.content.clone();
                session.append(Message::from(turn)).await;
                return TurnOutcome::Responded {
                    content,
                    iterations: iteration,
                };
            }

            debug!(
                iteration,
                tool_calls = turn.tool_calls.len(),
                "Assistant requested tools"
            );
            session.append(Message::from(turn.clone())).await;

            let outcome = self
                .dispatcher
                .dispatch_batch(turn.content.as_deref(), &turn.tool_calls, events)
                .await;
            session.extend(outcome.messages).await;
        }

        TurnOutcome::Failed(CoordinateError::MaxIterationsReached {
            max: self.max_iterations,
        })
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("dispatcher", &self.dispatcher)
            .field("tools", &self.catalog.len())
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}
