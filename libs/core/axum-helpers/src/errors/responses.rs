//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "message": "Error adding product",
        "error": "Kind: Server selection timeout"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - required fields missing",
    content_type = "application/json",
    example = json!({
        "message": "All fields are required except image",
        "received": { "title": "Desk lamp", "price": 0 },
        "missing": ["price", "description", "brand", "model", "color", "category", "discount"]
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "message": "Product not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);
