//! Seed writes for the drug-interaction graph.
//!
//! All writes use MERGE (upsert) semantics so reloading the same file is
//! idempotent. Drugs are identified by their lower-cased `name_en`.

use neo4rs::query;

use rxquery_core::types::{DRUG_LABEL, INTERACTION_TYPE};
use rxquery_core::Interaction;

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    /// Upsert a Drug node.
    pub async fn upsert_drug(&self, name: &str) -> Result<(), GraphError> {
        let cypher = format!("MERGE (d:{DRUG_LABEL} {{name_en: $name}})");
        let q = query(&cypher).param("name", normalize_name(name));
        self.run(q).await
    }

    /// Upsert both drugs and the directed interaction between them.
    pub async fn upsert_interaction(&self, interaction: &Interaction) -> Result<(), GraphError> {
        self.run(interaction_query(interaction)).await
    }

    /// Load a batch of interactions in a single transaction.
    /// Returns the number of interactions written.
    pub async fn seed(&self, interactions: &[Interaction]) -> Result<usize, GraphError> {
        let mut txn = self.start_txn().await?;

        for interaction in interactions {
            txn.run(interaction_query(interaction)).await?;
        }

        txn.commit().await?;
        tracing::info!(count = interactions.len(), "Seeded drug interactions");
        Ok(interactions.len())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn interaction_cypher() -> String {
    format!(
        "MERGE (a:{DRUG_LABEL} {{name_en: $source}})
         MERGE (b:{DRUG_LABEL} {{name_en: $target}})
         MERGE (a)-[r:{INTERACTION_TYPE}]->(b)
         SET r.severity = $severity, r.plain_warning = $plain_warning"
    )
}

fn interaction_query(interaction: &Interaction) -> neo4rs::Query {
    query(&interaction_cypher())
        .param("source", normalize_name(&interaction.source))
        .param("target", normalize_name(&interaction.target))
        .param("severity", interaction.severity.as_str().to_string())
        .param("plain_warning", interaction.plain_warning.clone())
}

/// Drug names are matched case-folded, so they are stored that way.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
