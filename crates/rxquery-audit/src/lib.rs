//! rxquery-audit: tamper-evident record of every translation.
//!
//! An audit record captures what a request asked, what the model produced,
//! what the safety gate decided, and what the database did. Records are
//! sealed with a BLAKE3 digest over their content, so later edits are
//! detectable when the record is read back.

pub mod hash;
pub mod session;
pub mod store;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rxquery_core::OutcomeKind;

/// Unique identifier for an audit record; also its file name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AuditId(pub Uuid);

impl AuditId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuditId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Pipeline stage a step belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Generate,
    Execute,
}

/// The safety gate's decision on a generated query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateVerdict {
    /// The cleaned query text the gate inspected.
    pub query: String,
    pub passed: bool,
    /// The denylisted keyword that triggered a rejection.
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub stage: Stage,
    pub success: bool,
    /// Row counts, timings, or the error text that clients never see.
    pub detail: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// The complete audit trail of one chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub id: AuditId,
    /// Request id shared with the request's log span.
    pub request_id: Uuid,
    /// The question as received; absent for malformed requests.
    pub question: Option<String>,
    /// `provider/model` that served the request.
    pub model: String,
    pub verdict: Option<GateVerdict>,
    pub steps: Vec<Step>,
    pub outcome: OutcomeKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Hex BLAKE3 digest of every other field. `None` until sealed.
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl AuditRecord {
    /// Whether the stored digest matches the record's current content.
    /// Unsealed records never verify.
    pub fn verify_integrity(&self) -> bool {
        let Some(stored) = self.content_hash.as_deref() else {
            return false;
        };
        let Ok(stored) = blake3::Hash::from_hex(stored) else {
            return false;
        };
        hash::content_digest(self).is_ok_and(|actual| actual == stored)
    }
}
