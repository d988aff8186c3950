use crate::engine::EngineError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found in database (id {id})")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Validation(String),

    /// The engine's live-status endpoint could not be reached or answered
    /// with a failure. Carries the underlying cause.
    #[error("Failed to get ETL job status: {0}")]
    StatusUnavailable(#[source] EngineError),

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
