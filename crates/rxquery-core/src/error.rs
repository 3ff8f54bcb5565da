use thiserror::Error;

/// Top-level error type shared by rxquery crates.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing required credential: {name}")]
    MissingCredential { name: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
