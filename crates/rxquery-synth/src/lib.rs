//! rxquery-synth: Natural-language to Cypher translation.
//!
//! A question is embedded in a fixed instruction template, sent to a hosted
//! language model, stripped of markdown fences, and passed through a lexical
//! denylist gate. Only text that survives the gate becomes a
//! [`SynthesizedQuery`].

pub mod gate;
pub mod llm;
pub mod prompt;
pub mod synthesizer;

pub use gate::{SynthesizedQuery, DENYLIST, SECURITY_VIOLATION_MESSAGE};
pub use llm::{CompletionModel, LlmClient, LlmError};
pub use synthesizer::{SynthError, Synthesizer};
