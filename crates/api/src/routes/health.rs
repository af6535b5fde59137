use axum::response::Json as ResponseJson;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness of the gateway process
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the gateway accepts connections
    pub status: String,
    /// Gateway build version
    pub version: String,
}

/// Liveness check for load balancers; no bearer token needed
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway is accepting requests", body = HealthResponse),
    ),
    tag = "Health"
)]
pub async fn health_check() -> ResponseJson<HealthResponse> {
    ResponseJson(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_build_version() {
        let ResponseJson(response) = health_check().await;

        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
