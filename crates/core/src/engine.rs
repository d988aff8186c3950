//! Contract for the external ETL processing engine.
//!
//! The engine is reached over HTTP (see `etl-engine`); this module only
//! defines the payloads and the trait the orchestrator depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};

use crate::types::JobId;

/// Body of the forward call `POST {base}/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSubmission {
    pub job_id: JobId,
    pub filename: String,
    pub study_id: Option<String>,
}

/// Live status reported by `GET {base}/jobs/{id}/status`.
///
/// The typed fields are read from the engine's body for logging and tests,
/// but serialization always emits the body exactly as received, including
/// explicit `null`s and fields this type does not know about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct EngineJobStatus {
    pub status: String,
    pub progress: Option<i64>,
    pub message: Option<String>,
    raw: serde_json::Value,
}

/// The fields of a live status the orchestrator understands.
#[derive(Deserialize)]
struct KnownFields {
    status: String,
    #[serde(default)]
    progress: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl EngineJobStatus {
    /// The engine's body, verbatim.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl TryFrom<serde_json::Value> for EngineJobStatus {
    type Error = serde_json::Error;

    fn try_from(raw: serde_json::Value) -> Result<Self, Self::Error> {
        let known = KnownFields::deserialize(&raw)?;
        Ok(Self {
            status: known.status,
            progress: known.progress,
            message: known.message,
            raw,
        })
    }
}

impl Serialize for EngineJobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request never got a response (DNS, connect, TLS, reset).
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("ETL engine did not respond in time")]
    Timeout,

    /// The engine answered with a non-2xx status.
    #[error("ETL engine error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected ETL engine response: {0}")]
    Decode(String),
}

/// The external processing engine. Every method is a single attempt.
#[async_trait]
pub trait EtlEngine: Send + Sync {
    /// Forward a job for processing. The success body is not inspected.
    async fn submit_job(&self, submission: &EngineSubmission) -> Result<(), EngineError>;

    async fn job_status(&self, job_id: JobId) -> Result<EngineJobStatus, EngineError>;

    async fn health(&self) -> Result<(), EngineError>;
}
