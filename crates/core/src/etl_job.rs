//! ETL job entity, its status lifecycle, and the submission DTO.
//!
//! The orchestrator only ever writes two transitions:
//!
//! ```text
//! pending --(forward call succeeds)--> running
//! pending --(forward call fails)-----> failed
//! ```
//!
//! `completed` exists for the engine's side of the lifecycle and is only
//! observed through live status queries.

use std::fmt;
use std::str::FromStr;

use chrono::SubsecRound;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Error message stored on a job whose forward call to the engine failed.
pub const FORWARD_FAILURE_MESSAGE: &str = "Failed to submit to ETL service";

/// Message returned when a submission has no usable filename.
pub const FILENAME_REQUIRED_MESSAGE: &str = "filename is required";

/// Current time at microsecond precision, the resolution PostgreSQL keeps,
/// so a job read back from the store equals the one that was written.
fn now() -> Timestamp {
    chrono::Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EtlJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl EtlJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EtlJobStatus::Pending => "pending",
            EtlJobStatus::Running => "running",
            EtlJobStatus::Completed => "completed",
            EtlJobStatus::Failed => "failed",
        }
    }
}

impl FromStr for EtlJobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EtlJobStatus::Pending),
            "running" => Ok(EtlJobStatus::Running),
            "completed" => Ok(EtlJobStatus::Completed),
            "failed" => Ok(EtlJobStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Invalid job status '{other}'. Must be one of: pending, running, completed, failed"
            ))),
        }
    }
}

impl fmt::Display for EtlJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One submitted unit of data-processing work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlJob {
    pub id: JobId,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_id: Option<String>,
    pub status: EtlJobStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Reserved for the engine's completion signal; never set by the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EtlJob {
    /// Build a fresh `pending` job with a random v4 id and
    /// `created_at == updated_at == now`.
    pub fn new_pending(filename: impl Into<String>, study_id: Option<String>) -> Self {
        let created_at = now();
        Self {
            id: JobId::new_v4(),
            filename: filename.into(),
            study_id,
            status: EtlJobStatus::Pending,
            created_at,
            updated_at: created_at,
            completed_at: None,
            error_message: None,
        }
    }

    /// Transition `pending -> running` after the engine accepted the job.
    pub fn mark_running(&mut self) -> Result<(), CoreError> {
        self.transition(EtlJobStatus::Running, None)
    }

    /// Transition `pending -> failed`, recording why.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        self.transition(EtlJobStatus::Failed, Some(message.into()))
    }

    fn transition(
        &mut self,
        to: EtlJobStatus,
        error_message: Option<String>,
    ) -> Result<(), CoreError> {
        if self.status != EtlJobStatus::Pending {
            return Err(CoreError::Internal(format!(
                "Job {} cannot move from {} to {to}",
                self.id, self.status
            )));
        }
        self.status = to;
        self.error_message = error_message;
        self.updated_at = now().max(self.created_at);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Submission DTO
// ---------------------------------------------------------------------------

/// Body of `POST /api/etl/jobs`.
///
/// `filename` is optional at the wire level so that an absent key, an
/// explicit `null` and an empty string all reach [`SubmitEtlJob::check`] and
/// are rejected with the same message.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEtlJob {
    #[serde(default)]
    #[validate(length(min = 1, message = "filename is required"))]
    pub filename: Option<String>,
    pub study_id: Option<String>,
}

impl SubmitEtlJob {
    pub fn new(filename: impl Into<String>, study_id: Option<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            study_id,
        }
    }

    /// Validate the submission and return the filename to record, mapping
    /// failures to [`CoreError::Validation`].
    ///
    /// Whitespace-only filenames are rejected as well.
    pub fn check(&self) -> Result<&str, CoreError> {
        self.validate()
            .map_err(|errors| CoreError::Validation(first_message(&errors)))?;
        match self.filename.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(CoreError::Validation(FILENAME_REQUIRED_MESSAGE.to_string())),
        }
    }
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
