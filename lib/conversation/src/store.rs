//! Session storage.
//!
//! The store is injected into the connection handler rather than held as
//! process-global state. It makes no promise that sessions survive a
//! process restart.

use crate::error::SessionError;
use crate::session::Session;
use async_trait::async_trait;
use queryline_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a new session seeded with the given system prompt.
    async fn create(&self, system_prompt: &str) -> Result<Arc<Session>, SessionError>;

    /// Gets a session by ID.
    async fn get(&self, id: SessionId) -> Result<Arc<Session>, SessionError>;

    /// Deletes a session. Deleting an unknown session is not an error.
    async fn delete(&self, id: SessionId) -> Result<(), SessionError>;
}

/// Process-local session store.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Session>>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, system_prompt: &str) -> Result<Arc<Session>, SessionError> {
        let session = Arc::new(Session::new(system_prompt));
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::clone(&session));
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound { id })
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemorySessionStore::new();
        let session = store.create("sys").await.unwrap();

        let fetched = store.get(session.id()).await.unwrap();
        assert!(Arc::ptr_eq(&session, &fetched));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn get_unknown_session_fails() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        let err = store.get(id).await.unwrap_err();
        assert_eq!(err, SessionError::NotFound { id });
    }

    #[tokio::test]
    async fn delete_removes_all_trace() {
        let store = InMemorySessionStore::new();
        let session = store.create("sys").await.unwrap();
        session.append(Message::user("hello")).await;
        let _guard = session.try_begin_turn();
        let id = session.id();

        store.delete(id).await.unwrap();
        assert!(store.get(id).await.is_err());
        assert!(store.is_empty().await);

        let fresh = store.create("sys").await.unwrap();
        assert_ne!(fresh.id(), id);
        assert_eq!(fresh.message_count().await, 1);
        assert!(!fresh.is_busy());
    }

    #[tokio::test]
    async fn delete_unknown_session_is_ok() {
        let store = InMemorySessionStore::new();
        assert!(store.delete(SessionId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = InMemorySessionStore::new();
        let a = store.create("sys").await.unwrap();
        let b = store.create("sys").await.unwrap();

        let _guard = a.try_begin_turn().expect("a starts");
        a.append(Message::user("only in a")).await;

        assert!(!b.is_busy());
        assert_eq!(b.message_count().await, 1);
    }
}
