//! ETL job lifecycle: submission, forward call, and reconciled reads.
//!
//! [`EtlOrchestrator`] owns no state of its own. Both collaborators are
//! injected at construction and every call runs its steps strictly in
//! sequence: store write, engine call, store write for `submit`; store read,
//! engine call for `get_status`. The engine is attempted at most once per
//! operation. Once validated, a submission runs to completion even if its
//! caller goes away.

use std::sync::Arc;

use etl_core::engine::{EngineJobStatus, EngineSubmission, EtlEngine};
use etl_core::error::CoreError;
use etl_core::etl_job::{EtlJob, EtlJobStatus, SubmitEtlJob, FORWARD_FAILURE_MESSAGE};
use etl_core::store::JobStore;
use etl_core::types::JobId;
use serde::Serialize;
use tracing::{instrument, Instrument};

/// Reachability of the two collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub store_healthy: bool,
    pub engine_healthy: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.store_healthy && self.engine_healthy
    }
}

#[derive(Clone)]
pub struct EtlOrchestrator {
    store: Arc<dyn JobStore>,
    engine: Arc<dyn EtlEngine>,
}

impl EtlOrchestrator {
    pub fn new(store: Arc<dyn JobStore>, engine: Arc<dyn EtlEngine>) -> Self {
        Self { store, engine }
    }

    /// Record a new job and forward it to the engine.
    ///
    /// A failed forward call is not an error: the job comes back (and is
    /// stored) as `failed` with [`FORWARD_FAILURE_MESSAGE`]. Only invalid
    /// input and store failures are returned as `Err`.
    ///
    /// The store/engine/store sequence runs on its own task, so a caller that
    /// stops waiting (e.g. a request timeout) cannot leave the job `pending`.
    #[instrument(skip(self, input), fields(filename = ?input.filename))]
    pub async fn submit(&self, input: SubmitEtlJob) -> Result<EtlJob, CoreError> {
        let filename = input.check()?.to_string();
        let job = EtlJob::new_pending(filename, input.study_id);

        let this = self.clone();
        tokio::spawn(async move { this.record_and_forward(job).await }.in_current_span())
            .await
            .map_err(|e| CoreError::Internal(format!("Job submission task failed: {e}")))?
    }

    async fn record_and_forward(&self, mut job: EtlJob) -> Result<EtlJob, CoreError> {
        self.store.create(&job).await?;
        tracing::debug!(job_id = %job.id, "ETL job recorded as pending");

        let submission = EngineSubmission {
            job_id: job.id,
            filename: job.filename.clone(),
            study_id: job.study_id.clone(),
        };

        match self.engine.submit_job(&submission).await {
            Ok(()) => {
                job.mark_running()?;
                self.store.update_status(&job).await?;
                tracing::info!(job_id = %job.id, "ETL job forwarded to engine");
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Forward call to ETL engine failed");
                job.mark_failed(FORWARD_FAILURE_MESSAGE)?;
                self.store.update_status(&job).await?;
            }
        }

        Ok(job)
    }

    /// The stored record, verbatim, or `None`.
    #[instrument(skip(self))]
    pub async fn get(&self, id: JobId) -> Result<Option<EtlJob>, CoreError> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Live status from the engine for a job known to the store.
    ///
    /// The stored status is never returned here; it only confirms the job
    /// exists before the network call is made.
    #[instrument(skip(self))]
    pub async fn get_status(&self, id: JobId) -> Result<EngineJobStatus, CoreError> {
        if self.store.get_by_id(id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "Job",
                id: id.to_string(),
            });
        }

        self.engine.job_status(id).await.map_err(|e| {
            tracing::warn!(job_id = %id, error = %e, "Live status lookup failed");
            CoreError::StatusUnavailable(e)
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<EtlJobStatus>) -> Result<Vec<EtlJob>, CoreError> {
        Ok(self.store.list_all(status).await?)
    }

    /// Check both collaborators. Never fails; unreachable ones are reported
    /// as unhealthy.
    pub async fn health(&self) -> HealthReport {
        let store_healthy = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Job store health check failed");
                false
            }
        };
        let engine_healthy = match self.engine.health().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "ETL engine health check failed");
                false
            }
        };

        HealthReport {
            store_healthy,
            engine_healthy,
        }
    }
}
