pub mod chat;
pub mod company;
pub mod health;
pub mod ws;

use axum::http::HeaderMap;

use crate::error::AppError;
use crate::state::AppState;

pub use health::{health_check, HealthResponse};

const API_KEY_HEADER: &str = "x-api-key";

/// REST authentication: a static key in the `X-API-Key` header. Missing
/// and invalid keys are distinct failures.
pub(crate) fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("API key is missing".to_string()))?;

    if provided != state.config.api_key {
        return Err(AppError::Forbidden("invalid API key".to_string()));
    }
    Ok(())
}
