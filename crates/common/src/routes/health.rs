//! Liveness endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health — reports that the named service is up.
pub async fn check(service: &'static str) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        service: service.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
