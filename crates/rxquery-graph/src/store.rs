//! The graph-store seam used by the chat pipeline.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use rxquery_core::Record;

use crate::client::{GraphClient, GraphConfig, GraphError};

/// Executes a query and returns its full, ordered result set.
#[async_trait]
pub trait QueryStore: Send + Sync {
    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError>;
}

#[async_trait]
impl QueryStore for GraphClient {
    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        self.execute_cypher(cypher).await
    }
}

/// A store that connects on first use and reuses the pool afterwards.
///
/// A failed connection attempt is not remembered, so the next request
/// tries again. This lets the server start before Neo4j is reachable.
pub struct LazyGraphStore {
    config: GraphConfig,
    client: OnceCell<GraphClient>,
}

impl LazyGraphStore {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Whether a connection pool has been established.
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&GraphClient, GraphError> {
        self.client
            .get_or_try_init(|| GraphClient::connect(&self.config))
            .await
    }
}

#[async_trait]
impl QueryStore for LazyGraphStore {
    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        self.client().await?.execute_cypher(cypher).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_store_starts_disconnected() {
        let store = LazyGraphStore::new(GraphConfig::default());
        assert!(!store.is_connected());
    }
}
