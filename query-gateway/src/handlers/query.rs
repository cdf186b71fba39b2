use crate::dtos::{IncomingQuery, QueryResponse};
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, Json};
use gateway_core::error::AppError;
use validator::Validate;

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON";
pub const MISSING_CONTENTS_MESSAGE: &str = "Missing 'contents' parameter";

/// Answer a signed query.
///
/// Runs behind the signature middleware, so `body` is the exact byte
/// sequence that was authenticated.
pub async fn handle_query(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QueryResponse>, AppError> {
    let query: IncomingQuery = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed query body");
        AppError::BadRequest(INVALID_JSON_MESSAGE.to_string())
    })?;

    query
        .validate()
        .map_err(|_| AppError::BadRequest(MISSING_CONTENTS_MESSAGE.to_string()))?;

    let text = state
        .generator
        .generate(&query.contents, query.parameters.as_ref())
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(QueryResponse { response: text }))
}
