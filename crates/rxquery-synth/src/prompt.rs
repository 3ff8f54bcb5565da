//! The fixed instruction template sent to the language model.

use rxquery_core::types::SCHEMA_PATTERN;
use rxquery_core::UserQuestion;

use crate::gate::DENYLIST;

/// Build the deterministic prompt for one question.
pub fn build_prompt(question: &UserQuestion) -> String {
    let denied = DENYLIST.join(", ");
    format!(
        "You are a Neo4j Cypher expert for a medical drug-interaction database.

Task: Generate a Cypher query to find interactions between drugs.
Schema: {SCHEMA_PATTERN}

User Input: \"{question}\"

Rules:
1. Extract the drug names from the input and convert them to a lowercase list.
2. Match nodes d1, d2 where toLower(d1.name_en) and toLower(d2.name_en) are in the list.
3. Ensure d1 and d2 are different nodes, ordered by id(d1) > id(d2).
4. Return source_drug, target_drug, and interaction_info.
5. Return ONLY the Cypher code, without markdown formatting.
6. Do NOT use destructive commands ({denied})."
    )
}
