//! The chat pipeline: validate, synthesize, gate, execute, respond.
//!
//! Each request is handled independently. Nothing is cached between
//! requests and a failed request leaves no state behind.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::Instrument;

use rxquery_audit::session::AuditSession;
use rxquery_audit::store::AuditStore;
use rxquery_core::{OutcomeKind, RequestId, UserQuestion};
use rxquery_graph::QueryStore;
use rxquery_synth::{SynthError, Synthesizer};

use crate::audit;
use crate::response::ChatResponse;

/// Request body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_question: Option<String>,
}

impl ChatRequest {
    /// Parse a raw body. Anything that is not a JSON object with a string
    /// (or null) `user_question` yields `None`.
    pub fn question_from_body(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ChatRequest>(body)
            .ok()
            .and_then(|r| r.user_question)
    }
}

pub struct ChatService {
    synthesizer: Synthesizer,
    store: Arc<dyn QueryStore>,
    audit: Option<Arc<dyn AuditStore>>,
}

impl ChatService {
    pub fn new(synthesizer: Synthesizer, store: Arc<dyn QueryStore>) -> Self {
        Self {
            synthesizer,
            store,
            audit: None,
        }
    }

    pub fn with_audit_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(store);
        self
    }

    /// Handle one raw request body.
    pub async fn handle_body(&self, body: &[u8]) -> ChatResponse {
        let question = ChatRequest::question_from_body(body);
        self.handle(question.as_deref()).await
    }

    /// Handle one question, which may be absent.
    pub async fn handle(&self, raw: Option<&str>) -> ChatResponse {
        let request_id = RequestId::new();
        let span = tracing::info_span!("chat", request_id = %request_id);
        self.handle_inner(request_id, raw).instrument(span).await
    }

    async fn handle_inner(&self, request_id: RequestId, raw: Option<&str>) -> ChatResponse {
        let mut session = AuditSession::new(request_id.0, raw, &self.synthesizer.model_label());

        let question = match UserQuestion::parse(raw) {
            Ok(q) => q,
            Err(e) => {
                tracing::info!(reason = %e, "Rejected request");
                audit::persist(session, OutcomeKind::RequestInvalid, self.audit.clone()).await;
                return ChatResponse::RequestInvalid;
            }
        };

        tracing::info!(question = %question, "Received question");

        let query = match self.synthesizer.synthesize(&question).await {
            Ok(q) => q,
            Err(e) => {
                match &e {
                    SynthError::SecurityViolation { keyword, query } => {
                        tracing::warn!(keyword = %keyword, query = %query, "Blocked unsafe query");
                        session.blocked(query, keyword);
                    }
                    other => {
                        tracing::error!(error = %other, "Query generation failed");
                        session.generation_failed(&other.to_string());
                    }
                }
                let outcome = e.kind();
                audit::persist(session, outcome, self.audit.clone()).await;
                return ChatResponse::GenerationFailed {
                    details: e.to_string(),
                };
            }
        };

        tracing::info!(query = %query, "Generated query");
        session.generated(query.as_str());

        let started = Instant::now();
        let result = self.store.execute(query.as_str()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(records) => {
                tracing::info!(rows = records.len(), duration_ms, "Query executed");
                session.executed(records.len(), duration_ms);
                audit::persist(session, OutcomeKind::Success, self.audit.clone()).await;
                ChatResponse::Success {
                    records,
                    query_used: query.into_inner(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, duration_ms, "Query execution failed");
                session.execution_failed(&e.to_string(), duration_ms);
                audit::persist(session, OutcomeKind::ExecutionError, self.audit.clone()).await;
                ChatResponse::ExecutionFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rxquery_audit::store::{AuditFilter, FileAuditStore};
    use rxquery_audit::Stage;
    use rxquery_core::Record;
    use rxquery_graph::GraphError;
    use rxquery_synth::{CompletionModel, LlmError};

    use super::*;

    struct ScriptedModel {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn describe(&self) -> String {
            "scripted/test".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl QueryStore for RecordingStore {
        async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
            self.seen.lock().unwrap().push(cypher.to_string());
            if self.fail {
                return Err(GraphError::Connection("refused at 10.0.0.7".to_string()));
            }
            let mut row = Record::new();
            row.insert("source_drug".to_string(), serde_json::json!("aspirin"));
            Ok(vec![row])
        }
    }

    fn service(reply: &str, store: Arc<RecordingStore>) -> (ChatService, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        });
        let service = ChatService::new(Synthesizer::new(model.clone()), store);
        (service, model)
    }

    #[tokio::test]
    async fn blank_question_skips_model() {
        let store = Arc::new(RecordingStore::default());
        let (service, model) = service("MATCH (n) RETURN n", store.clone());

        assert_eq!(service.handle(None).await, ChatResponse::RequestInvalid);
        assert_eq!(service.handle(Some("   ")).await, ChatResponse::RequestInvalid);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn denied_query_never_reaches_store() {
        let store = Arc::new(RecordingStore::default());
        let (service, _) = service("MATCH (n) DETACH DELETE n", store.clone());

        let response = service.handle(Some("Remove everything")).await;
        assert!(matches!(response, ChatResponse::GenerationFailed { .. }));
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_receives_cleaned_query() {
        let store = Arc::new(RecordingStore::default());
        let (service, _) = service("```cypher\nMATCH (d:Drug) RETURN d.name_en\n```", store.clone());

        let response = service.handle(Some("List drugs")).await;
        match response {
            ChatResponse::Success {
                records,
                query_used,
            } => {
                assert_eq!(query_used, "MATCH (d:Drug) RETURN d.name_en");
                assert_eq!(records.len(), 1);
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(
            store.seen.lock().unwrap().as_slice(),
            ["MATCH (d:Drug) RETURN d.name_en"]
        );
    }

    #[tokio::test]
    async fn store_failure_hides_detail() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let (service, _) = service("MATCH (n) RETURN n", store);

        let response = service.handle(Some("anything")).await;
        assert_eq!(response, ChatResponse::ExecutionFailed);
        assert!(!response.body().to_string().contains("10.0.0.7"));
    }

    #[test]
    fn body_parsing() {
        assert_eq!(
            ChatRequest::question_from_body(br#"{"user_question":"hi"}"#).as_deref(),
            Some("hi")
        );
        assert_eq!(ChatRequest::question_from_body(br#"{}"#), None);
        assert_eq!(ChatRequest::question_from_body(br#"{"user_question":null}"#), None);
        assert_eq!(ChatRequest::question_from_body(br#"{"user_question":7}"#), None);
        assert_eq!(ChatRequest::question_from_body(b"not json"), None);
        assert_eq!(ChatRequest::question_from_body(br#"["hi"]"#), None);
    }

    #[tokio::test]
    async fn outcomes_are_audited() {
        let dir = tempfile::tempdir().unwrap();
        let audit_store = Arc::new(FileAuditStore::new(dir.path()).unwrap());

        let store = Arc::new(RecordingStore::default());
        let (service, _) = service("MATCH (n) SET n.x = 1", store);
        let service = service.with_audit_store(audit_store.clone());

        service.handle(Some("change things")).await;
        service.handle(None).await;

        let records = audit_store.list(&AuditFilter::default()).unwrap().records;
        assert_eq!(records.len(), 2);

        let violation = records
            .iter()
            .find(|r| r.outcome == OutcomeKind::SecurityViolation)
            .unwrap();
        let verdict = violation.verdict.as_ref().unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.keyword.as_deref(), Some("SET"));
        assert_eq!(violation.model, "scripted/test");
        assert!(violation.verify_integrity());

        assert!(records
            .iter()
            .any(|r| r.outcome == OutcomeKind::RequestInvalid && r.question.is_none()));
    }

    #[tokio::test]
    async fn store_error_detail_is_kept_in_audit_trail() {
        let dir = tempfile::tempdir().unwrap();
        let audit_store = Arc::new(FileAuditStore::new(dir.path()).unwrap());

        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let (service, _) = service("MATCH (n) RETURN n", store);
        let service = service.with_audit_store(audit_store.clone());

        assert_eq!(service.handle(Some("aspirin?")).await, ChatResponse::ExecutionFailed);

        let records = audit_store.list(&AuditFilter::default()).unwrap().records;
        assert_eq!(records.len(), 1);
        let execute = records[0]
            .steps
            .iter()
            .find(|s| s.stage == Stage::Execute)
            .unwrap();
        assert!(!execute.success);
        assert!(execute.detail["error"].as_str().unwrap().contains("10.0.0.7"));
    }
}
