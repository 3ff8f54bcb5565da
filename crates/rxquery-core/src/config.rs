//! Configuration management for rxquery services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Legacy environment variables (GOOGLE_API_KEY, NEO4J_URI, NEO4J_USER,
//!    NEO4J_PASSWORD, PORT)
//! 2. Environment variables (RXQUERY__ prefix, `__` separator)
//! 3. Config file (rxquery.toml)
//! 4. Defaults

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::CoreError;

/// Prefix for structured environment overrides, e.g. `RXQUERY__NEO4J__URI`.
pub const ENV_PREFIX: &str = "RXQUERY";

/// Unprefixed variables understood for compatibility, mapped to config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("GOOGLE_API_KEY", "llm.api_key"),
    ("NEO4J_URI", "neo4j.uri"),
    ("NEO4J_USER", "neo4j.user"),
    ("NEO4J_PASSWORD", "neo4j.password"),
    ("PORT", "server.port"),
];

/// Top-level configuration, built once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listening port (default: 5000).
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Hosted text-completion providers.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }

    /// Local providers run without credentials.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// HTTP timeout for one completion call.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    /// Unset counts as a missing credential; the graph client then dials
    /// `bolt://localhost:7687`.
    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default = "default_neo4j_user")]
    pub user: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// Deadline for executing one query and draining its rows.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Directory for audit records. Auditing is disabled when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_port() -> u16 {
    5000
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_query_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            api_key: None,
            api_base_url: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: None,
            user: default_neo4j_user(),
            password: None,
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl AppConfig {
    /// Load from `<file_prefix>.toml` and the process environment.
    ///
    /// The result is not validated; call [`AppConfig::validate`] before
    /// serving requests.
    pub fn load(file_prefix: &str) -> Result<Self, CoreError> {
        Self::load_from(file_prefix, std::env::vars().collect())
    }

    /// Load from `<file_prefix>.toml` and an explicit environment map.
    pub fn load_from(file_prefix: &str, env: HashMap<String, String>) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            );

        for (var, key) in LEGACY_ENV {
            let value = env.get(*var).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        Self::from_config(builder.build()?)
    }

    pub fn from_config(cfg: config::Config) -> Result<Self, CoreError> {
        Ok(cfg.try_deserialize()?)
    }

    /// Fail on a missing model-provider key; only warn on missing store credentials.
    pub fn validate(&self) -> Result<(), CoreError> {
        let key_missing = self
            .llm
            .api_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty());

        if self.llm.provider.requires_api_key() && key_missing {
            return Err(CoreError::MissingCredential {
                name: "llm.api_key (GOOGLE_API_KEY)".to_string(),
            });
        }

        if self.store_credentials_missing() {
            tracing::warn!("Neo4j credentials missing. Database connection will fail.");
        }

        Ok(())
    }

    pub fn store_credentials_missing(&self) -> bool {
        self.neo4j.uri.is_none() || self.neo4j.password.is_none()
    }
}
