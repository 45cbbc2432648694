//! Validation response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::brackets::{ValidationResult, ValidationStatus};

/// `{"status": "..."}`, sent with 200 when valid and 400 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationResponse {
    pub status: ValidationStatus,
}

impl ValidationResponse {
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            ValidationStatus::Valid => StatusCode::OK,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<&ValidationResult> for ValidationResponse {
    fn from(result: &ValidationResult) -> Self {
        Self {
            status: result.status(),
        }
    }
}

impl IntoResponse for ValidationResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
