//! Route handlers.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::error::AppError;
use crate::health::ClusterStatus;
use crate::http::response::ValidationResponse;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::stats::StatsSnapshot;

/// Pull the `string` field out of a JSON body.
///
/// An empty body counts as a missing field, not as malformed JSON.
pub fn extract_input(body: &[u8]) -> Result<String, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::MissingField);
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| AppError::MalformedJson)?;
    match value.get("string") {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(AppError::MissingField),
    }
}

/// `POST /validate`
pub async fn validate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<ValidationResponse, AppError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        _ => AppError::Internal(rejection.body_text()),
    })?;
    let input = extract_input(&body)?;

    let result = state.validator.validate_string(&input);
    metrics::record_validation(result.status());

    tracing::debug!(status = %result.status(), length = result.brackets().chars().count(), "Validated input");

    if let Some(stats) = &state.stats {
        stats.submit(result.brackets(), result.is_valid());
    }

    Ok(ValidationResponse::from(&result))
}

/// `GET /status`
pub async fn cluster_status(State(state): State<AppState>) -> Result<Json<ClusterStatus>, AppError> {
    let status = state.health.check().await?;
    Ok(Json(status))
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.recorder.get_stats().await)
}

/// `GET /health`
pub async fn liveness() -> &'static str {
    "ok"
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
