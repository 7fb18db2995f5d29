use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use dossier_core::CompanyRecord;

use crate::error::AppError;
use crate::routes::require_api_key;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompanyDataRequest {
    pub company_name: String,
}

#[utoipa::path(
    post,
    path = "/api/company",
    request_body = CompanyDataRequest,
    responses(
        (status = 200, description = "Company record", body = CompanyRecord),
        (status = 401, description = "API key missing"),
        (status = 403, description = "API key invalid"),
    ),
    tag = "company"
)]
pub async fn get_company_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CompanyDataRequest>,
) -> Result<Json<CompanyRecord>, AppError> {
    require_api_key(&state, &headers)?;

    if request.company_name.trim().is_empty() {
        return Err(AppError::BadRequest("company_name must not be empty".to_string()));
    }

    Ok(Json(state.directory.lookup_or_mock(&request.company_name)))
}
