use std::sync::Arc;

use etl_pipeline::EtlOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Job lifecycle orchestrator wired to the job store and ETL engine.
    pub orchestrator: Arc<EtlOrchestrator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
