//! Post-processing and the read-only safety gate.
//!
//! The gate is lexical: the upper-cased query text is rejected if it
//! contains any denylisted keyword as a substring. It over-rejects (a
//! keyword inside a string literal, a comment, or a word such as `OFFSET`)
//! and under-rejects (`CREATE`, `MERGE`, and mutating procedure calls are
//! not on the list). It is a minimum bar, not a sandbox; the Neo4j user the
//! service connects as should itself be read-only.

use std::fmt;

use crate::synthesizer::SynthError;

/// Keywords that mark a query as potentially mutating.
pub const DENYLIST: [&str; 5] = ["DELETE", "DETACH", "REMOVE", "SET", "DROP"];

/// Markdown fence markers removed from model output. Longest first.
pub const FENCE_MARKERS: [&str; 2] = ["```cypher", "```"];

/// Client-facing message for a gate rejection.
pub const SECURITY_VIOLATION_MESSAGE: &str =
    "Security Violation: Potential malicious query detected.";

/// A Cypher string that has passed the denylist gate.
///
/// Only [`SynthesizedQuery::gate`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedQuery(String);

impl SynthesizedQuery {
    /// Admit `text` if it contains no denylisted keyword.
    pub fn gate(text: String) -> Result<Self, SynthError> {
        match find_denied_keyword(&text) {
            Some(keyword) => Err(SynthError::SecurityViolation { keyword, query: text }),
            None => Ok(Self(text)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SynthesizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove every fence marker and the surrounding whitespace.
pub fn strip_fences(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for marker in FENCE_MARKERS {
        text = text.replace(marker, "");
    }
    text.trim().to_string()
}

/// Return the first denylisted keyword found in `query`, case-insensitively.
pub fn find_denied_keyword(query: &str) -> Option<&'static str> {
    let upper = query.to_uppercase();
    DENYLIST.into_iter().find(|keyword| upper.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "MATCH (d1:Drug), (d2:Drug)\nWHERE toLower(d1.name_en) IN ['aspirin', 'warfarin']\nRETURN d1.name_en AS source_drug";

    #[test]
    fn strips_cypher_fence() {
        let raw = format!("```cypher\n{BODY}\n```");
        assert_eq!(strip_fences(&raw), BODY);
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        let raw = format!("\n\n  ```\n{BODY}\n```  \n");
        assert_eq!(strip_fences(&raw), BODY);
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_fences(&format!("  {BODY}\t")), BODY);
        assert_eq!(strip_fences(BODY), BODY);
    }

    #[test]
    fn fence_markers_are_removed_anywhere() {
        assert_eq!(strip_fences("MATCH (n) ```RETURN n```"), "MATCH (n) RETURN n");
    }

    #[test]
    fn every_keyword_is_denied_in_any_case() {
        for keyword in DENYLIST {
            let lower = format!("MATCH (n) {} n", keyword.to_lowercase());
            assert_eq!(find_denied_keyword(&lower), Some(keyword));

            let mixed = format!("match (n) // harmless {keyword}ting\nreturn n");
            assert_eq!(find_denied_keyword(&mixed), Some(keyword));
        }
    }

    #[test]
    fn substring_matches_over_reject() {
        // OFFSET contains SET.
        assert_eq!(find_denied_keyword("MATCH (n) RETURN n OFFSET 5"), Some("SET"));
        assert_eq!(
            find_denied_keyword("MATCH (d:Drug {name_en: 'dropropizine'}) RETURN d"),
            Some("DROP")
        );
    }

    #[test]
    fn read_query_passes() {
        let query = SynthesizedQuery::gate(BODY.to_string()).unwrap();
        assert_eq!(query.as_str(), BODY);
    }

    #[test]
    fn mutating_query_is_rejected_with_keyword() {
        let err = SynthesizedQuery::gate("MATCH (n) DETACH DELETE n".to_string()).unwrap_err();
        match err {
            SynthError::SecurityViolation { keyword, query } => {
                assert_eq!(keyword, "DELETE");
                assert_eq!(query, "MATCH (n) DETACH DELETE n");
            }
            other => panic!("expected security violation, got {other:?}"),
        }
    }
}
