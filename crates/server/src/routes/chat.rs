//! Question answering over a previously composed dossier. One LLM round
//! trip, no tools; not part of the orchestration state machine.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::routes::require_api_key;
use crate::state::AppState;

const CHAT_SYSTEM_PROMPT: &str = r#"You are an assistant specialized in analyzing startup and venture
capital data. Answer the user's query about the provided JSON data and,
when a chart would help, include visualization data.

Respond with a JSON object with two fields:
- "response": a 40-60 word text answer to the query
- "visualization": optional chart data with "type" (bar_chart,
  line_chart, pie_chart), "data" ("labels" and "datasets"), and optional
  "options"

Omit "visualization" when a chart would not add anything."#;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub query: String,
    /// The dossier (or any JSON document) the query is about.
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub visualization: Option<Value>,
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer with optional visualization data", body = ChatResponse),
        (status = 401, description = "API key missing"),
        (status = 403, description = "API key invalid"),
    ),
    tag = "chat"
)]
pub async fn chat_dossier(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    require_api_key(&state, &headers)?;

    if request.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let data = serde_json::to_string_pretty(&request.data)
        .map_err(|e| AppError::BadRequest(format!("unserializable data: {e}")))?;
    let user = format!("User Query: {}\n\nJSON Data:\n{}", request.query, data);

    let content = state
        .chat
        .complete(CHAT_SYSTEM_PROMPT, &user)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(parse_chat_reply(&content)))
}

/// The model is asked for JSON but not trusted to produce it; plain
/// text falls back to a chart-free answer.
fn parse_chat_reply(content: &str) -> ChatResponse {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let response = value
                .get("response")
                .and_then(Value::as_str)
                .unwrap_or(trimmed)
                .to_string();
            let visualization = value.get("visualization").filter(|v| !v.is_null()).cloned();
            ChatResponse {
                response,
                visualization,
            }
        }
        Err(_) => ChatResponse {
            response: trimmed.to_string(),
            visualization: None,
        },
    }
}
