use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every collaborator answers, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the job store is reachable.
    pub store_healthy: bool,
    /// Whether the ETL engine's `/health` endpoint answers.
    pub engine_healthy: bool,
    /// Configured ETL engine base URL.
    pub engine_url: String,
}

/// GET /health -- returns service, job store, and ETL engine health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.orchestrator.health().await;

    let status = if report.is_healthy() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store_healthy: report.store_healthy,
        engine_healthy: report.engine_healthy,
        engine_url: state.config.etl_service_url.clone(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/etl`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
