pub mod handlers;
pub mod responses;

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Error body returned by every endpoint.
///
/// `message` is always present. The other fields appear depending on the kind
/// of failure:
///
/// ```json
/// { "message": "All fields are required except image", "received": {"title": ""}, "missing": ["title"] }
/// { "message": "Product not found" }
/// { "message": "Error adding product", "error": "connection refused" }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable summary
    pub message: String,
    /// Underlying error detail for server-side failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Request payload echoed back on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<Value>,
    /// Names of required fields that were missing or empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl ErrorResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
            received: None,
            missing: Vec::new(),
        }
    }
}

/// Application error type that renders as an [`ErrorResponse`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Form extraction error: {0}")]
    FormExtractorRejection(#[from] FormRejection),

    #[error("Bad Request: {message}")]
    BadRequest {
        message: String,
        received: Value,
        missing: Vec<String>,
    },

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("{message}: {error}")]
    InternalServerError { message: String, error: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JsonExtractorRejection(e) => e.status(),
            AppError::FormExtractorRejection(e) => e.status(),
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(message: impl Into<String>, error: impl ToString) -> Self {
        AppError::InternalServerError {
            message: message.into(),
            error: error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!("JSON extraction error: {:?}", e);
                ErrorResponse {
                    received: Some(Value::Null),
                    ..ErrorResponse::message(e.body_text())
                }
            }
            AppError::FormExtractorRejection(e) => {
                tracing::warn!("Form extraction error: {:?}", e);
                ErrorResponse {
                    received: Some(Value::Null),
                    ..ErrorResponse::message(e.body_text())
                }
            }
            AppError::BadRequest {
                message,
                received,
                missing,
            } => {
                tracing::info!(?missing, "Bad request: {}", message);
                ErrorResponse {
                    message,
                    error: None,
                    received: Some(received),
                    missing,
                }
            }
            AppError::NotFound(message) => {
                tracing::info!("Not found: {}", message);
                ErrorResponse::message(message)
            }
            AppError::InternalServerError { message, error } => {
                tracing::error!(error = %error, "{}", message);
                ErrorResponse {
                    error: Some(error),
                    ..ErrorResponse::message(message)
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
