//! queryline gateway server.
//!
//! This crate provides the HTTP and WebSocket surface of the gateway:
//! configuration loading, the router, and the per-connection handler that
//! feeds user messages into the orchestration loop.

pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod ws;

pub use app::router;
pub use config::ServerConfig;
pub use error::ServerError;
pub use state::AppState;
