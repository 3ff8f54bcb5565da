//! rxquery-graph: Neo4j client for the drug-interaction graph.
//!
//! Reads arrive as untrusted-but-gated Cypher text from the chat pipeline
//! and are executed through [`QueryStore`]. Writes are limited to the
//! trusted seed loader in [`mutations`].

pub mod client;
pub mod mutations;
pub mod queries;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use store::{LazyGraphStore, QueryStore};
