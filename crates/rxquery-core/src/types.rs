//! Core domain types for the drug-interaction graph and the chat pipeline.
//!
//! Everything here is a transient, per-request value or a constant
//! describing the graph schema shared by the prompt and the seed loader.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// ── Graph Schema ──────────────────────────────────────────────────

/// Label of drug nodes.
pub const DRUG_LABEL: &str = "Drug";

/// Relationship type connecting two interacting drugs.
pub const INTERACTION_TYPE: &str = "CONTRAINDICATES";

/// Cypher pattern describing the whole graph schema.
pub const SCHEMA_PATTERN: &str = "(:Drug {name_en: 'string'}) \
     -[:CONTRAINDICATES {severity: 'string', plain_warning: 'string'}]-> (:Drug)";

/// Severity classification carried on a CONTRAINDICATES relationship.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Major,
    Moderate,
    Minor,
    #[default]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Moderate => "moderate",
            Self::Minor => "minor",
            Self::Unknown => "unknown",
        }
    }
}

/// A directed drug-interaction fact, as loaded by the seed command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interaction {
    /// Name of the source drug (any case; stored lower-cased).
    pub source: String,
    /// Name of the target drug (any case; stored lower-cased).
    pub target: String,
    #[serde(default)]
    pub severity: Severity,
    /// Human-readable warning shown to the user.
    pub plain_warning: String,
}

// ── Request Values ────────────────────────────────────────────────

/// Unique identifier for one handled request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A natural-language question that is present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuestion(String);

impl UserQuestion {
    /// Validate a raw question. Absent, empty, and whitespace-only input
    /// are all rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw {
            Some(q) if !q.trim().is_empty() => Ok(Self(q.to_string())),
            Some(_) => Err(CoreError::InvalidRequest("user_question is empty".to_string())),
            None => Err(CoreError::InvalidRequest("user_question is missing".to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a query result: column name to value.
pub type Record = serde_json::Map<String, serde_json::Value>;

// ── Outcomes ──────────────────────────────────────────────────────

/// Terminal classification of a chat request.
///
/// `GenerationError` and `SecurityViolation` share a response shape but
/// are kept apart for logging and auditing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    RequestInvalid,
    GenerationError,
    SecurityViolation,
    ExecutionError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RequestInvalid => "request_invalid",
            Self::GenerationError => "generation_error",
            Self::SecurityViolation => "security_violation",
            Self::ExecutionError => "execution_error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "success" => Ok(Self::Success),
            "request_invalid" => Ok(Self::RequestInvalid),
            "generation_error" => Ok(Self::GenerationError),
            "security_violation" => Ok(Self::SecurityViolation),
            "execution_error" => Ok(Self::ExecutionError),
            _ => Err(CoreError::InvalidRequest(format!(
                "unknown outcome: {s}. Choose: success, request_invalid, generation_error, \
                 security_violation, execution_error"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_rejects_missing_and_blank() {
        assert!(UserQuestion::parse(None).is_err());
        assert!(UserQuestion::parse(Some("")).is_err());
        assert!(UserQuestion::parse(Some("  \n\t")).is_err());
    }

    #[test]
    fn question_keeps_text_verbatim() {
        let q = UserQuestion::parse(Some(" Does aspirin interact with warfarin? ")).unwrap();
        assert_eq!(q.as_str(), " Does aspirin interact with warfarin? ");
    }

    #[test]
    fn interaction_severity_defaults_to_unknown() {
        let json = r#"{"source": "Aspirin", "target": "Warfarin", "plain_warning": "Bleeding risk"}"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.severity, Severity::Unknown);

        let json = r#"{"source": "a", "target": "b", "severity": "major", "plain_warning": "x"}"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.severity, Severity::Major);
    }

    #[test]
    fn outcome_kind_parses_cli_spellings() {
        assert_eq!(
            "security-violation".parse::<OutcomeKind>().unwrap(),
            OutcomeKind::SecurityViolation
        );
        assert_eq!("SUCCESS".parse::<OutcomeKind>().unwrap(), OutcomeKind::Success);
        assert!("exploded".parse::<OutcomeKind>().is_err());
    }

    #[test]
    fn outcome_kind_serializes_snake_case() {
        let json = serde_json::to_string(&OutcomeKind::GenerationError).unwrap();
        assert_eq!(json, "\"generation_error\"");
    }

    #[test]
    fn schema_pattern_names_labels() {
        assert!(SCHEMA_PATTERN.contains(DRUG_LABEL));
        assert!(SCHEMA_PATTERN.contains(INTERACTION_TYPE));
    }
}
