//! The Job Store contract: durable persistence for [`EtlJob`] records.

use async_trait::async_trait;

use crate::etl_job::{EtlJob, EtlJobStatus};
use crate::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("no job with id {0}")]
    Missing(JobId),
}

/// Persistence collaborator for ETL jobs.
///
/// Implementations must give read-your-writes consistency: a `get_by_id`
/// issued after a successful `create`/`update_status` observes that write.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &EtlJob) -> Result<(), StoreError>;

    /// Persist the `status`, `error_message` and `updated_at` of `job`, which
    /// must already exist. The stored `updated_at` is exactly `job.updated_at`.
    async fn update_status(&self, job: &EtlJob) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<EtlJob>, StoreError>;

    /// All jobs in creation order, optionally restricted to one status.
    async fn list_all(&self, status: Option<EtlJobStatus>) -> Result<Vec<EtlJob>, StoreError>;

    /// Cheap liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
