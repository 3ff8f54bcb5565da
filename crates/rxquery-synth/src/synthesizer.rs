//! The query synthesizer: question in, gated Cypher out.

use std::sync::Arc;

use rxquery_core::{OutcomeKind, UserQuestion};

use crate::gate::{self, SynthesizedQuery, SECURITY_VIOLATION_MESSAGE};
use crate::llm::{CompletionModel, LlmError};
use crate::prompt;

/// Why a question could not be turned into a safe query.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The completion call failed. Displays the underlying error.
    #[error(transparent)]
    Generation(#[from] LlmError),

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    /// The generated text hit the denylist gate.
    #[error("{}", SECURITY_VIOLATION_MESSAGE)]
    SecurityViolation {
        keyword: &'static str,
        query: String,
    },
}

impl SynthError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::SecurityViolation { .. } => OutcomeKind::SecurityViolation,
            Self::Generation(_) | Self::EmptyCompletion => OutcomeKind::GenerationError,
        }
    }
}

/// Translates questions into read-only Cypher through a completion model.
#[derive(Clone)]
pub struct Synthesizer {
    model: Arc<dyn CompletionModel>,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// `provider/model` label of the underlying completion model.
    pub fn model_label(&self) -> String {
        self.model.describe()
    }

    pub async fn synthesize(&self, question: &UserQuestion) -> Result<SynthesizedQuery, SynthError> {
        let prompt = prompt::build_prompt(question);
        let raw = self.model.complete(&prompt).await?;

        let cleaned = gate::strip_fences(&raw);
        if cleaned.is_empty() {
            return Err(SynthError::EmptyCompletion);
        }

        let query = SynthesizedQuery::gate(cleaned)?;
        tracing::debug!(query = %query, "Query synthesized");
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Returns a fixed completion and remembers the prompts it saw.
    struct FixedModel {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedModel {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for FixedModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(LlmError::Api)
        }

        fn describe(&self) -> String {
            "fixed/test".to_string()
        }
    }

    fn question(text: &str) -> UserQuestion {
        UserQuestion::parse(Some(text)).unwrap()
    }

    #[tokio::test]
    async fn returns_gated_query() {
        let model = FixedModel::ok("MATCH (d1:Drug), (d2:Drug) RETURN d1, d2");
        let synth = Synthesizer::new(model.clone());

        let query = synth.synthesize(&question("aspirin and warfarin")).await.unwrap();
        assert_eq!(query.as_str(), "MATCH (d1:Drug), (d2:Drug) RETURN d1, d2");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("aspirin and warfarin"));
    }

    #[tokio::test]
    async fn strips_fences_before_gate() {
        let synth = Synthesizer::new(FixedModel::ok("```cypher\nMATCH (d1:Drug) RETURN d1\n```"));
        let query = synth.synthesize(&question("aspirin")).await.unwrap();
        assert_eq!(query.as_str(), "MATCH (d1:Drug) RETURN d1");
    }

    #[tokio::test]
    async fn rejects_denied_keyword() {
        let synth = Synthesizer::new(FixedModel::ok("MATCH (d:Drug) SET d.name_en = 'x'"));
        let err = synth.synthesize(&question("rename aspirin")).await.unwrap_err();
        assert_eq!(err.kind(), OutcomeKind::SecurityViolation);
        assert_eq!(err.to_string(), SECURITY_VIOLATION_MESSAGE);
    }

    #[tokio::test]
    async fn model_failure_is_generation_error_with_detail() {
        let synth = Synthesizer::new(FixedModel::failing("quota exhausted"));
        let err = synth.synthesize(&question("aspirin")).await.unwrap_err();
        assert_eq!(err.kind(), OutcomeKind::GenerationError);
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn blank_completion_is_generation_error() {
        let synth = Synthesizer::new(FixedModel::ok("  ```cypher\n```  "));
        let err = synth.synthesize(&question("aspirin")).await.unwrap_err();
        assert!(matches!(err, SynthError::EmptyCompletion));
        assert_eq!(err.kind(), OutcomeKind::GenerationError);
    }
}
