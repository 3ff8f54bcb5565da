//! rxquery-server: HTTP API for natural-language drug-interaction queries.
//!
//! Wires the synthesizer, the graph store, and the audit trail into one
//! request pipeline and exposes it over axum.

pub mod audit;
pub mod error;
pub mod pipeline;
pub mod response;
pub mod routes;

pub use error::ServerError;
pub use pipeline::ChatService;
pub use response::ChatResponse;
pub use routes::{build_state, router, serve, AppState};
