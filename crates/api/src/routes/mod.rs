pub mod etl_jobs;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/etl` route tree.
///
/// ```text
/// /jobs                    list, submit
/// /jobs/{id}               stored job
/// /jobs/{id}/status        live engine status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/jobs", etl_jobs::router())
}
