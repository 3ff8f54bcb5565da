//! The response envelope returned for every chat request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use rxquery_core::Record;

pub const MISSING_QUESTION: &str = "Missing 'user_question' in request body";
pub const GENERATION_FAILED: &str = "Query generation failed";
pub const EXECUTION_FAILED: &str = "Database execution error";
pub const EXECUTION_HINT: &str = "Check your query or connection.";

/// One of the four outward shapes a chat request can end in.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    Success {
        records: Vec<Record>,
        query_used: String,
    },
    RequestInvalid,
    /// Covers both model failures and gate rejections.
    GenerationFailed {
        details: String,
    },
    /// Store errors are never echoed to the client.
    ExecutionFailed,
}

impl ChatResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success { .. } => StatusCode::OK,
            Self::RequestInvalid => StatusCode::BAD_REQUEST,
            Self::GenerationFailed { .. } | Self::ExecutionFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Success {
                records,
                query_used,
            } => json!({
                "status": "success",
                "retrieved_data": records,
                "query_used": query_used,
            }),
            Self::RequestInvalid => json!({ "error": MISSING_QUESTION }),
            Self::GenerationFailed { details } => json!({
                "error": GENERATION_FAILED,
                "details": details,
            }),
            Self::ExecutionFailed => json!({
                "error": EXECUTION_FAILED,
                "message": EXECUTION_HINT,
            }),
        }
    }
}

impl IntoResponse for ChatResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_shape() {
        let mut record = Record::new();
        record.insert("source_drug".to_string(), json!("warfarin"));

        let response = ChatResponse::Success {
            records: vec![record],
            query_used: "MATCH (d1:Drug) RETURN d1".to_string(),
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.body(),
            json!({
                "status": "success",
                "retrieved_data": [{"source_drug": "warfarin"}],
                "query_used": "MATCH (d1:Drug) RETURN d1",
            })
        );
    }

    #[test]
    fn failure_shapes() {
        assert_eq!(ChatResponse::RequestInvalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ChatResponse::RequestInvalid.body(),
            json!({"error": "Missing 'user_question' in request body"})
        );

        let generation = ChatResponse::GenerationFailed {
            details: "boom".to_string(),
        };
        assert_eq!(generation.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            generation.body(),
            json!({"error": "Query generation failed", "details": "boom"})
        );

        assert_eq!(
            ChatResponse::ExecutionFailed.body(),
            json!({"error": "Database execution error", "message": "Check your query or connection."})
        );
    }
}
