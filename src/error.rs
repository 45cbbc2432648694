//! Request-level errors and their HTTP mapping.
//!
//! Every error body has the shape `{"error":{"message":"..."}}`. Detail for
//! cluster and internal failures goes to the log, never to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::health::HealthError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Field \"string\" is required and must be a string")]
    MissingField,

    #[error("Malformed JSON in request")]
    MalformedJson,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Route not found")]
    NotFound,

    #[error("Cache cluster unavailable")]
    ClusterUnavailable(#[from] HealthError),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField | AppError::MalformedJson => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ClusterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorMessage {
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ClusterUnavailable(e) => {
                tracing::error!(error = %e, "Cluster status unavailable");
            }
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
            }
            other => tracing::debug!(error = %other, "Request rejected"),
        }

        (self.status_code(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
