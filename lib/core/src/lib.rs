//! Core types shared by every queryline crate.
//!
//! This crate provides the strongly-typed identifiers and the error
//! handling foundation used by the conversation gateway.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{SessionId, TurnId};
