use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Builds a CORS layer for the given origins.
///
/// Allows the verbs the REST API uses plus the headers a browser client sends
/// with JSON bodies. Preflight responses are cached for an hour.
///
/// # Errors
/// Returns `InvalidInput` when an origin is not a valid header value or the
/// list is empty.
pub fn create_cors_layer<S: AsRef<str>>(origins: &[S]) -> io::Result<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.as_ref().parse::<HeaderValue>())
        .collect::<Result<_, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS origin: {}", e),
            )
        })?;

    if allowed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "At least one CORS origin is required",
        ));
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600)))
}
