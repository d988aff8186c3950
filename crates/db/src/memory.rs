//! In-process [`JobStore`] kept behind a `tokio` read/write lock.
//!
//! Used when no `DATABASE_URL` is configured and as the store double in
//! tests. Records live for the lifetime of the process.

use async_trait::async_trait;
use etl_core::etl_job::{EtlJob, EtlJobStatus};
use etl_core::store::{JobStore, StoreError};
use etl_core::types::JobId;
use tokio::sync::RwLock;

/// Jobs in insertion order.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<Vec<EtlJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &EtlJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.iter().any(|j| j.id == job.id) {
            return Err(StoreError::Query(format!("duplicate job id {}", job.id)));
        }
        jobs.push(job.clone());
        Ok(())
    }

    async fn update_status(&self, job: &EtlJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or(StoreError::Missing(job.id))?;

        stored.status = job.status;
        stored.error_message = job.error_message.clone();
        stored.updated_at = job.updated_at.max(stored.created_at);
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<EtlJob>, StoreError> {
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn list_all(&self, status: Option<EtlJobStatus>) -> Result<Vec<EtlJob>, StoreError> {
        Ok(self
            .jobs
            .read()
            .await
            .iter()
            .filter(|j| status.map_or(true, |s| j.status == s))
            .cloned()
            .collect())
    }
}
