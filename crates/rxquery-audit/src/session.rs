//! Per-request recorder, filled in as the request moves through the pipeline.
//!
//! ```no_run
//! # use rxquery_audit::session::AuditSession;
//! # use rxquery_core::OutcomeKind;
//! # use uuid::Uuid;
//! let mut session = AuditSession::new(Uuid::new_v4(), Some("Does aspirin interact with warfarin?"), "gemini/gemini-1.5-flash");
//! session.generated("MATCH (d1:Drug) RETURN d1");
//! session.executed(1, 12);
//! let record = session.finish(OutcomeKind::Success).unwrap();
//! assert!(record.verify_integrity());
//! ```

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use rxquery_core::OutcomeKind;

use crate::{hash, AuditId, AuditRecord, GateVerdict, Stage, Step};

pub struct AuditSession {
    request_id: Uuid,
    question: Option<String>,
    model: String,
    verdict: Option<GateVerdict>,
    steps: Vec<Step>,
    started_at: DateTime<Utc>,
}

impl AuditSession {
    pub fn new(request_id: Uuid, question: Option<&str>, model: &str) -> Self {
        Self {
            request_id,
            question: question.map(str::to_string),
            model: model.to_string(),
            verdict: None,
            steps: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// The model produced a query and the gate let it through.
    pub fn generated(&mut self, query: &str) {
        self.push(Stage::Generate, true, json!({ "chars": query.len() }));
        self.verdict = Some(GateVerdict {
            query: query.to_string(),
            passed: true,
            keyword: None,
        });
    }

    /// The model produced a query and the gate refused it.
    pub fn blocked(&mut self, query: &str, keyword: &str) {
        self.push(Stage::Generate, true, json!({ "chars": query.len() }));
        self.verdict = Some(GateVerdict {
            query: query.to_string(),
            passed: false,
            keyword: Some(keyword.to_string()),
        });
    }

    /// The completion call failed or returned nothing usable.
    pub fn generation_failed(&mut self, error: &str) {
        self.push(Stage::Generate, false, json!({ "error": error }));
    }

    pub fn executed(&mut self, rows: usize, duration_ms: u64) {
        self.push(
            Stage::Execute,
            true,
            json!({ "rows": rows, "duration_ms": duration_ms }),
        );
    }

    pub fn execution_failed(&mut self, error: &str, duration_ms: u64) {
        self.push(
            Stage::Execute,
            false,
            json!({ "error": error, "duration_ms": duration_ms }),
        );
    }

    /// Close the session with its outcome and seal the record.
    pub fn finish(self, outcome: OutcomeKind) -> Result<AuditRecord, serde_json::Error> {
        let mut record = AuditRecord {
            id: AuditId::new(),
            request_id: self.request_id,
            question: self.question,
            model: self.model,
            verdict: self.verdict,
            steps: self.steps,
            outcome,
            started_at: self.started_at,
            completed_at: Utc::now(),
            content_hash: None,
        };
        hash::seal(&mut record)?;
        Ok(record)
    }

    fn push(&mut self, stage: Stage, success: bool, detail: serde_json::Value) {
        self.steps.push(Step {
            stage,
            success,
            detail,
            at: Utc::now(),
        });
    }
}
