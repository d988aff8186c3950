//! Handlers for the `/etl/jobs` resource.
//!
//! Submission always answers `201` once the job is recorded, even when the
//! engine refused it; the returned job's `status` tells the caller which.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use etl_core::error::CoreError;
use etl_core::etl_job::{EtlJobStatus, SubmitEtlJob};
use etl_core::types::JobId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for `GET /api/etl/jobs`.
#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    /// Optional status filter, e.g. `?status=completed`.
    pub status: Option<String>,
}

/// Job ids are opaque to callers: a path segment that is not one of ours
/// simply names no job, so it yields `None` rather than a 400.
fn parse_job_id(raw: &str) -> Option<JobId> {
    JobId::parse_str(raw).ok()
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/etl/jobs
pub async fn submit_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitEtlJob>,
) -> AppResult<impl IntoResponse> {
    let job = state.orchestrator.submit(input).await?;

    tracing::info!(job_id = %job.id, status = %job.status, "ETL job submitted");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(job, "ETL job submitted successfully")),
    ))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/etl/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = match parse_job_id(&id) {
        Some(job_id) => state.orchestrator.get(job_id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::NotFound("Job not found".into()))?;

    Ok(Json(ApiResponse::ok(job, "Job retrieved successfully")))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/etl/jobs/{id}/status
///
/// Live status from the engine, not the stored one.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job_id = parse_job_id(&id).ok_or(CoreError::NotFound { entity: "Job", id })?;
    let status = state.orchestrator.get_status(job_id).await?;

    Ok(Json(ApiResponse::ok(
        status,
        "Job status retrieved successfully",
    )))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/etl/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<EtlJobStatus>)
        .transpose()?;

    let jobs = state.orchestrator.list(filter).await?;

    Ok(Json(ApiResponse::ok(jobs, "ETL jobs fetched successfully")))
}
