use axum_helpers::AppError;
use serde_json::Value;
use thiserror::Error;

use crate::assets::AssetError;

pub const VALIDATION_MESSAGE: &str = "All fields are required except image";
pub const NOT_FOUND_MESSAGE: &str = "Product not found";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading image";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String>, received: Value },

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Image upload failed: {0}")]
    Upload(#[from] AssetError),

    #[error("Database error: {0}")]
    Database(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// The request a failure happened in; selects the message of 500 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::Create => "Error adding product",
            Operation::List => "Error fetching products",
            Operation::Get => "Error fetching product",
            Operation::Update => "Error updating product",
            Operation::Delete => "Error deleting product",
        }
    }
}

impl ProductError {
    /// Convert into the shared HTTP error for a failure during `operation`.
    pub fn into_app_error(self, operation: Operation) -> AppError {
        match self {
            ProductError::Validation { missing, received } => AppError::BadRequest {
                message: VALIDATION_MESSAGE.to_string(),
                received,
                missing,
            },
            ProductError::NotFound(_) => AppError::NotFound(NOT_FOUND_MESSAGE.to_string()),
            ProductError::Upload(e) => AppError::internal(UPLOAD_FAILED_MESSAGE, e),
            ProductError::Database(msg) => AppError::internal(operation.failure_message(), msg),
        }
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = ProductError::Validation {
            missing: vec!["title".to_string()],
            received: json!({}),
        };

        match err.into_app_error(Operation::Create) {
            AppError::BadRequest { message, missing, .. } => {
                assert_eq!(message, VALIDATION_MESSAGE);
                assert_eq!(missing, vec!["title"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_database_error_uses_operation_message() {
        let app = ProductError::Database("timeout".into()).into_app_error(Operation::Update);

        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.to_string(), "Error updating product: timeout");
    }

    #[test]
    fn test_upload_error_message_ignores_operation() {
        let app = ProductError::Upload(AssetError::Rejected("bad file".into()))
            .into_app_error(Operation::Update);

        assert!(app.to_string().starts_with(UPLOAD_FAILED_MESSAGE));
    }

    #[test]
    fn test_not_found_message() {
        let app = ProductError::NotFound("abc".into()).into_app_error(Operation::Delete);

        assert_eq!(app.status(), StatusCode::NOT_FOUND);
        assert!(matches!(app, AppError::NotFound(ref m) if m == NOT_FOUND_MESSAGE));
    }
}
