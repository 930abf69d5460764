use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

/// Fixed apology returned whenever the pipeline fails; the real cause
/// only goes to the log.
const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Response {
    match state.rag.query(&body.question).await {
        Ok(answer) => {
            tracing::debug!(sources = ?answer.sources, "chat answered");
            Json(json!({ "answer": answer.text })).into_response()
        }
        Err(err) => {
            tracing::error!("chat query failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "answer": APOLOGY })),
            )
                .into_response()
        }
    }
}
