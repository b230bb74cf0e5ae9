use mongodb::Client;
use std::time::Instant;

use super::connector::ping;

/// Outcome of a MongoDB health check
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Driver error message when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Ping with timing and error detail, for readiness endpoints.
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();
    let result = ping(client).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    HealthStatus {
        healthy: result.is_ok(),
        message: result.err().map(|e| e.to_string()),
        response_time_ms,
    }
}
