//! Readiness endpoint

use axum::{extract::State, routing::get, Router};
use axum_helpers::server::{run_health_checks, HealthCheckFuture, HealthCheckResult};
use database::mongodb::check_health_detailed;

use crate::state::AppState;

/// Reports 503 until MongoDB answers a ping.
async fn ready(State(state): State<AppState>) -> HealthCheckResult {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "database",
        Box::pin(async {
            let status = check_health_detailed(&state.mongo_client).await;
            tracing::debug!(
                healthy = status.healthy,
                response_time_ms = status.response_time_ms,
                "MongoDB ping"
            );
            if status.healthy {
                Ok(())
            } else {
                Err(status.message.unwrap_or_default())
            }
        }),
    )];

    run_health_checks(checks).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use core_config::{app_info, server::ServerConfig, Environment};
    use database::mongodb::MongoConfig;
    use domain_products::assets::UnconfiguredAssetStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_ready_reports_unreachable_database() {
        let url = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100";
        let mongo_client = mongodb::Client::with_uri_str(url).await.unwrap();
        let state = AppState {
            config: Config {
                app: app_info!(),
                mongodb: MongoConfig::new(url),
                server: ServerConfig::default(),
                environment: Environment::Development,
                cloudinary: None,
            },
            db: mongo_client.database("ecommerce"),
            mongo_client,
            assets: Arc::new(UnconfiguredAssetStore),
        };

        let response = router(state)
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["database"], "disconnected");
        assert_eq!(body["status"], "not ready");
    }
}
