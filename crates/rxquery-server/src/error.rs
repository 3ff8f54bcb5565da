//! Error types for the rxquery-server crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] rxquery_core::CoreError),

    #[error("Synthesizer error: {0}")]
    Synth(#[from] rxquery_synth::SynthError),

    #[error("Graph error: {0}")]
    Graph(#[from] rxquery_graph::GraphError),

    #[error("Audit store error: {0}")]
    Audit(#[from] rxquery_audit::store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
