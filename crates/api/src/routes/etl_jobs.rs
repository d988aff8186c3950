//! Route definitions for the `/etl/jobs` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::etl_jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                -> list_jobs (?status=)
/// POST   /                -> submit_job
/// GET    /{id}            -> get_job
/// GET    /{id}/status     -> get_job_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(etl_jobs::list_jobs).post(etl_jobs::submit_job))
        .route("/{id}", get(etl_jobs::get_job))
        .route("/{id}/status", get(etl_jobs::get_job_status))
}
