//! REST API client for the ETL engine, built on [`reqwest`].
//!
//! Every request is a single attempt bounded by the client timeout; a
//! timeout surfaces as [`EngineError::Timeout`] like any other failure.

use std::time::Duration;

use async_trait::async_trait;
use etl_core::engine::{EngineError, EngineJobStatus, EngineSubmission, EtlEngine};
use etl_core::types::JobId;

/// Default per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one ETL engine instance.
#[derive(Debug, Clone)]
pub struct EtlEngineApi {
    client: reqwest::Client,
    base_url: String,
}

impl EtlEngineApi {
    /// Create a client for the engine at `base_url`, e.g. `http://etl:8000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(classify)?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, or an [`EngineError::Api`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Map a transport-level [`reqwest::Error`] onto the engine error taxonomy.
fn classify(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout
    } else if err.is_decode() {
        EngineError::Decode(err.to_string())
    } else {
        EngineError::Transport(err.to_string())
    }
}

#[async_trait]
impl EtlEngine for EtlEngineApi {
    async fn submit_job(&self, submission: &EngineSubmission) -> Result<(), EngineError> {
        tracing::debug!(
            job_id = %submission.job_id,
            engine = %self.base_url,
            "Forwarding job to ETL engine"
        );

        let response = self
            .client
            .post(format!("{}/jobs", self.base_url))
            .json(submission)
            .send()
            .await
            .map_err(classify)?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn job_status(&self, job_id: JobId) -> Result<EngineJobStatus, EngineError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}/status", self.base_url, job_id))
            .send()
            .await
            .map_err(classify)?;

        let response = Self::ensure_success(response).await?;
        response.json::<EngineJobStatus>().await.map_err(classify)
    }

    async fn health(&self) -> Result<(), EngineError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(classify)?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}
