//! Body extractor accepting JSON or urlencoded forms.

use crate::errors::AppError;
use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request body as an untyped JSON value.
///
/// `application/x-www-form-urlencoded` bodies become an object of string
/// values. Everything else goes through [`Json`], so a missing or foreign
/// content type is rejected the way `Json` rejects it.
///
/// ```ignore
/// async fn create(JsonOrForm(body): JsonOrForm) -> Result<Json<Value>, AppError> {
///     Ok(Json(body))
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonOrForm(pub Value);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

impl<S> FromRequest<S> for JsonOrForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(fields) = Form::<Map<String, Value>>::from_request(req, state).await?;
            return Ok(JsonOrForm(Value::Object(fields)));
        }

        let Json(value) = Json::<Value>::from_request(req, state).await?;
        Ok(JsonOrForm(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use serde_json::json;

    async fn extract(content_type: Option<&str>, body: &str) -> Result<Value, AppError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();

        JsonOrForm::from_request(req, &()).await.map(|JsonOrForm(v)| v)
    }

    #[tokio::test]
    async fn test_json_body() {
        let value = extract(Some("application/json"), r#"{"price": 10}"#).await.unwrap();
        assert_eq!(value, json!({ "price": 10 }));
    }

    #[tokio::test]
    async fn test_form_body_becomes_string_object() {
        let value = extract(
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            "title=Desk+lamp&price=25&image=",
        )
        .await
        .unwrap();

        assert_eq!(
            value,
            json!({ "title": "Desk lamp", "price": "25", "image": "" })
        );
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unsupported() {
        let err = extract(None, r#"{"price": 10}"#).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = extract(Some("application/json"), "{").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
