use actix_web::{web, HttpResponse};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::database::Database;

lazy_static! {
    static ref STARTED_AT: Instant = Instant::now();
}

/// Marks the process start for the uptime counter.
pub fn mark_started() {
    lazy_static::initialize(&STARTED_AT);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// "mongodb" ou "memory"
    pub store: String,
    pub uptime_seconds: u64,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Document store is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<Database>) -> HttpResponse {
    let reachable = match db.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::error!("❌ Health check: store ping failed: {}", e);
            false
        }
    };

    let body = HealthResponse {
        status: if reachable { "healthy" } else { "unhealthy" }.to_string(),
        service: "career-canvas".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: db.backend().to_string(),
        uptime_seconds: STARTED_AT.elapsed().as_secs(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if reachable {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
