//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`CompletionConfig`] and [`DataAccessConfig`] for the backend
//! sections (`COMPLETION__*` and `DATA_ACCESS__*`).

use crate::error::ServerError;
use queryline_ai::CompletionConfig;
use queryline_integration::DataAccessConfig;
use serde::Deserialize;
use std::net::SocketAddr;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// First message of every session's history.
    pub system_prompt: String,

    /// Completion backend configuration.
    pub completion: CompletionConfig,

    /// Data-access backend configuration.
    pub data_access: DataAccessConfig,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> queryline_core::Result<Self, ServerError> {
        let loaded = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| ServerError::Config {
                reason: e.to_string(),
            })?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects required values that are present but blank.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] naming the first blank value.
    pub fn validate(&self) -> Result<(), ServerError> {
        let required = [
            ("SYSTEM_PROMPT", &self.system_prompt),
            ("COMPLETION__API_KEY", &self.completion.api_key),
            ("DATA_ACCESS__BASE_URL", &self.data_access.base_url),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ServerError::Config {
                reason: format!("{name} must not be empty"),
            }),
            None => Ok(()),
        }
    }
}
