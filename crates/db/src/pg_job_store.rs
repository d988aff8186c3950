//! PostgreSQL-backed [`JobStore`] over the `etl_jobs` table.

use async_trait::async_trait;
use etl_core::etl_job::{EtlJob, EtlJobStatus};
use etl_core::store::{JobStore, StoreError};
use etl_core::types::{JobId, Timestamp};
use sqlx::{FromRow, PgPool};
use tracing::instrument;

/// Column list for `etl_jobs` queries.
const COLUMNS: &str = "\
    id, filename, study_id, status, \
    created_at, updated_at, completed_at, error_message";

/// A raw row from `etl_jobs`; `status` is stored as lowercase text.
#[derive(Debug, FromRow)]
struct EtlJobRow {
    id: JobId,
    filename: String,
    study_id: Option<String>,
    status: String,
    created_at: Timestamp,
    updated_at: Timestamp,
    completed_at: Option<Timestamp>,
    error_message: Option<String>,
}

impl TryFrom<EtlJobRow> for EtlJob {
    type Error = StoreError;

    fn try_from(row: EtlJobRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<EtlJobStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(EtlJob {
            id: row.id,
            filename: row.filename,
            study_id: row.study_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            error_message: row.error_message,
        })
    }
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create(&self, job: &EtlJob) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO etl_jobs \
                 (id, filename, study_id, status, created_at, updated_at, completed_at, error_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(job.id)
        .bind(&job.filename)
        .bind(&job.study_id)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .bind(&job.error_message)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, status = %job.status))]
    async fn update_status(&self, job: &EtlJob) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE etl_jobs \
             SET status = $2, error_message = $3, updated_at = GREATEST($4, created_at) \
             WHERE id = $1",
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(&job.error_message)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(job.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<EtlJob>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM etl_jobs WHERE id = $1");
        let row = sqlx::query_as::<_, EtlJobRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(EtlJob::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_all(&self, status: Option<EtlJobStatus>) -> Result<Vec<EtlJob>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM etl_jobs \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, EtlJobRow>(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter().map(EtlJob::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(map_sqlx)
    }
}
