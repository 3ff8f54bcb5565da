//! Neo4j connection management and shared graph client.

use std::time::Duration;

use neo4rs::{ConfigBuilder, Graph, Query};

use rxquery_core::config::Neo4jConfig;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Query timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    pub query_timeout: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            max_connections: 16,
            fetch_size: 256,
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Neo4jConfig> for GraphConfig {
    fn from(cfg: &Neo4jConfig) -> Self {
        let defaults = Self::default();
        Self {
            uri: cfg.uri.clone().unwrap_or(defaults.uri),
            user: cfg.user.clone(),
            password: cfg.password.clone().unwrap_or_default(),
            max_connections: cfg.max_connections,
            fetch_size: cfg.fetch_size,
            query_timeout: Duration::from_secs(cfg.query_timeout_secs),
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    query_timeout: Duration,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            query_timeout: config.query_timeout,
        })
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Execute a write query, discarding any rows.
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Begin a transaction.
    pub async fn start_txn(&self) -> Result<neo4rs::Txn, GraphError> {
        Ok(self.graph.start_txn().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_neo4j_section() {
        let section = Neo4jConfig {
            uri: Some("bolt://graph:7687".to_string()),
            user: "reader".to_string(),
            password: Some("pw".to_string()),
            max_connections: 4,
            fetch_size: 64,
            query_timeout_secs: 7,
        };

        let config = GraphConfig::from(&section);
        assert_eq!(config.uri, "bolt://graph:7687");
        assert_eq!(config.user, "reader");
        assert_eq!(config.password, "pw");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.query_timeout, Duration::from_secs(7));
    }

    #[test]
    fn config_falls_back_to_local_uri() {
        let config = GraphConfig::from(&Neo4jConfig::default());
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert!(config.password.is_empty());
        assert_eq!(config.query_timeout, Duration::from_secs(30));
    }
}
