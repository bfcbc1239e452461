//! Shared application state.

use crate::config::ServerConfig;
use crate::error::ServerError;
use queryline_ai::{Coordinator, OpenAiCompletionClient, ToolDispatcher};
use queryline_conversation::{InMemorySessionStore, SessionStore, ToolCatalog};
use queryline_integration::{HttpDataAccess, QueryRouter};
use std::fmt;
use std::sync::Arc;

/// State shared by every connection.
pub struct AppState {
    /// Live sessions, one per open connection.
    pub store: Arc<dyn SessionStore>,
    /// Runs turns against the configured backends.
    pub coordinator: Arc<Coordinator>,
    /// Seed message for new sessions.
    pub system_prompt: String,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        store: Arc<dyn SessionStore>,
        coordinator: Coordinator,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            store,
            coordinator: Arc::new(coordinator),
            system_prompt: system_prompt.into(),
        }
    }

    /// Builds the HTTP backend clients and an in-memory session store.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend client rejects its configuration.
    pub fn from_config(config: &ServerConfig) -> queryline_core::Result<Self, ServerError> {
        let completion = OpenAiCompletionClient::new(config.completion.clone()).map_err(|e| {
            ServerError::Backend {
                reason: e.to_string(),
            }
        })?;
        let data_access =
            HttpDataAccess::from_config(&config.data_access).map_err(|e| ServerError::Backend {
                reason: e.to_string(),
            })?;

        let coordinator = Coordinator::new(
            Arc::new(completion),
            ToolDispatcher::new(QueryRouter::new(Arc::new(data_access))),
            ToolCatalog::sql(),
        );

        Ok(Self::new(
            Arc::new(InMemorySessionStore::new()),
            coordinator,
            config.system_prompt.as_str(),
        ))
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
