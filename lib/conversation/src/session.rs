//! Conversation session state.
//!
//! A session owns one connection's message history and its busy flag.
//! The busy flag is the only concurrency control in the gateway: a turn
//! may start only by acquiring a [`TurnGuard`], and at most one guard
//! exists per session at any time.

use crate::message::Message;
use chrono::{DateTime, TimeDelta, Utc};
use queryline_core::SessionId;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A conversation session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    history: RwLock<Vec<Message>>,
    busy: AtomicBool,
}

impl Session {
    /// Creates a new session seeded with a system message.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            history: RwLock::new(vec![Message::system(system_prompt)]),
            busy: AtomicBool::new(false),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns how long the session has existed.
    #[must_use]
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.created_at
    }

    /// Appends a message to the history.
    pub async fn append(&self, message: Message) {
        self.history.write().await.push(message);
    }

    /// Appends several messages, preserving their order.
    pub async fn extend(&self, messages: impl IntoIterator<Item = Message>) {
        self.history.write().await.extend(messages);
    }

    /// Returns a snapshot of the history.
    pub async fn history(&self) -> Vec<Message> {
        self.history.read().await.clone()
    }

    /// Returns the number of messages in the history.
    pub async fn message_count(&self) -> usize {
        self.history.read().await.len()
    }

    /// Returns true while a turn is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Marks the session busy and returns a guard, or `None` if a turn is
    /// already running.
    ///
    /// The flag is cleared when the guard drops, including when the task
    /// holding it is aborted.
    #[must_use]
    pub fn try_begin_turn(self: &Arc<Self>) -> Option<TurnGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TurnGuard {
                session: Arc::clone(self),
            })
    }
}

/// Exclusive right to run one turn on a session.
#[derive(Debug)]
pub struct TurnGuard {
    session: Arc<Session>,
}

impl TurnGuard {
    /// Returns the session this guard belongs to.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.session.busy.store(false, Ordering::Release);
    }
}
