//! rxquery-core: Shared types, configuration, and error handling for rxquery.
//!
//! This crate provides the foundational types used across all rxquery components:
//! - The drug-interaction graph schema (Drug nodes, CONTRAINDICATES edges)
//! - Per-request values (validated questions, request ids, result records)
//! - Outcome classification for the chat pipeline
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::CoreError;
pub use types::{Interaction, OutcomeKind, Record, RequestId, Severity, UserQuestion};
