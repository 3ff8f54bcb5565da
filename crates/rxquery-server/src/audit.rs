//! Persisting a request's audit session.

use std::sync::Arc;

use rxquery_audit::session::AuditSession;
use rxquery_audit::store::AuditStore;
use rxquery_core::OutcomeKind;

/// Seal the session and hand it to the store, if one is configured.
///
/// Sealing and storage failures are logged and never reach the client.
pub async fn persist(session: AuditSession, outcome: OutcomeKind, store: Option<Arc<dyn AuditStore>>) {
    let Some(store) = store else {
        return;
    };

    let record = match session.finish(outcome) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to seal audit record");
            return;
        }
    };

    let audit_id = record.id;
    match tokio::task::spawn_blocking(move || store.save(&record)).await {
        Ok(Ok(())) => {
            tracing::debug!(audit_id = %audit_id, outcome = %outcome, "Audit record stored");
        }
        Ok(Err(e)) => {
            tracing::warn!(audit_id = %audit_id, error = %e, "Failed to store audit record");
        }
        Err(e) => {
            tracing::warn!(audit_id = %audit_id, error = %e, "Audit task panicked");
        }
    }
}
