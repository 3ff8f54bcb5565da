//! Read execution for gated Cypher text.

use neo4rs::query;

use rxquery_core::Record;

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    /// Execute raw Cypher and materialize every row as a JSON record.
    ///
    /// The whole execution, including draining the row stream, is bounded
    /// by the configured query timeout.
    pub async fn execute_cypher(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        let timeout = self.query_timeout();
        let rows = tokio::time::timeout(timeout, self.query_rows(query(cypher)))
            .await
            .map_err(|_| GraphError::Timeout {
                secs: timeout.as_secs(),
            })??;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(row_to_record(row)?);
        }

        tracing::debug!(rows = records.len(), "Query materialized");
        Ok(records)
    }
}

/// Convert a neo4rs::Row into a column-name keyed JSON record.
fn row_to_record(row: &neo4rs::Row) -> Result<Record, GraphError> {
    let value: serde_json::Value = row
        .to()
        .map_err(|e| GraphError::Serialization(format!("Failed to deserialize row: {e}")))?;

    into_record(value)
}

fn into_record(value: serde_json::Value) -> Result<Record, GraphError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(GraphError::Serialization(format!(
            "Expected a row object, got {other}"
        ))),
    }
}
