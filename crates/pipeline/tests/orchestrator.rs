//! Lifecycle tests for [`EtlOrchestrator`] using an in-memory store and a
//! scripted engine double.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use etl_core::engine::{EngineError, EngineJobStatus, EngineSubmission, EtlEngine};
use etl_core::error::CoreError;
use etl_core::etl_job::{EtlJob, EtlJobStatus, SubmitEtlJob, FORWARD_FAILURE_MESSAGE};
use etl_core::store::{JobStore, StoreError};
use etl_core::types::JobId;
use etl_db::InMemoryJobStore;
use etl_pipeline::EtlOrchestrator;

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Outcome {
    Accept,
    Reject,
    Unreachable,
    Timeout,
}

/// Engine double that replays a fixed outcome and records every call.
struct ScriptedEngine {
    submit_outcome: Outcome,
    submit_delay: Duration,
    live_status: Option<EngineJobStatus>,
    submissions: Mutex<Vec<EngineSubmission>>,
    status_calls: AtomicUsize,
}

impl ScriptedEngine {
    fn new(submit_outcome: Outcome) -> Self {
        Self {
            submit_outcome,
            submit_delay: Duration::ZERO,
            live_status: None,
            submissions: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        }
    }

    fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    fn with_live_status(mut self, status: EngineJobStatus) -> Self {
        self.live_status = Some(status);
        self
    }

    fn submissions(&self) -> Vec<EngineSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EtlEngine for ScriptedEngine {
    async fn submit_job(&self, submission: &EngineSubmission) -> Result<(), EngineError> {
        self.submissions.lock().unwrap().push(submission.clone());
        tokio::time::sleep(self.submit_delay).await;
        match self.submit_outcome {
            Outcome::Accept => Ok(()),
            Outcome::Reject => Err(EngineError::Api {
                status: 500,
                body: "internal".into(),
            }),
            Outcome::Unreachable => Err(EngineError::Transport("connection refused".into())),
            Outcome::Timeout => Err(EngineError::Timeout),
        }
    }

    async fn job_status(&self, _job_id: JobId) -> Result<EngineJobStatus, EngineError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.live_status
            .clone()
            .ok_or_else(|| EngineError::Transport("connect ECONNREFUSED 10.0.0.5:8000".into()))
    }

    async fn health(&self) -> Result<(), EngineError> {
        match self.submit_outcome {
            Outcome::Accept => Ok(()),
            _ => Err(EngineError::Transport("down".into())),
        }
    }
}

/// Store wrapper counting writes, delegating to [`InMemoryJobStore`].
#[derive(Default)]
struct CountingStore {
    inner: InMemoryJobStore,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl CountingStore {
    fn writes(&self) -> (usize, usize) {
        (
            self.creates.load(Ordering::SeqCst),
            self.updates.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl JobStore for CountingStore {
    async fn create(&self, job: &EtlJob) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(job).await
    }

    async fn update_status(&self, job: &EtlJob) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_status(job).await
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<EtlJob>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn list_all(&self, status: Option<EtlJobStatus>) -> Result<Vec<EtlJob>, StoreError> {
        self.inner.list_all(status).await
    }
}

fn orchestrator(
    engine: ScriptedEngine,
) -> (EtlOrchestrator, Arc<CountingStore>, Arc<ScriptedEngine>) {
    let store = Arc::new(CountingStore::default());
    let engine = Arc::new(engine);
    let orch = EtlOrchestrator::new(store.clone(), engine.clone());
    (orch, store, engine)
}

fn live(status: &str, progress: Option<i64>, message: Option<&str>) -> EngineJobStatus {
    serde_json::from_value(serde_json::json!({
        "jobId": "engine-side-id",
        "status": status,
        "progress": progress,
        "message": message,
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accepted_submission_is_running_in_store_and_result() {
    let (orch, store, engine) = orchestrator(ScriptedEngine::new(Outcome::Accept));

    let job = orch
        .submit(SubmitEtlJob::new("patients.csv", Some("S1".into())))
        .await
        .unwrap();

    assert_eq!(job.status, EtlJobStatus::Running);
    assert!(job.error_message.is_none());

    let stored = orch.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.filename, "patients.csv");
    assert_eq!(stored.study_id.as_deref(), Some("S1"));
    assert_eq!(stored, job, "returned job matches the stored record exactly");
    assert!(stored.updated_at >= stored.created_at);

    let sent = engine.submissions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].job_id, job.id);
    assert_eq!(sent[0].filename, "patients.csv");
    assert_eq!(sent[0].study_id.as_deref(), Some("S1"));

    assert_eq!(store.writes(), (1, 1));
}

#[tokio::test]
async fn unreachable_engine_yields_failed_job_without_error() {
    let (orch, store, engine) = orchestrator(ScriptedEngine::new(Outcome::Unreachable));

    let job = orch
        .submit(SubmitEtlJob::new("bad.csv", None))
        .await
        .expect("forward failure must not surface as an error");

    assert_eq!(job.status, EtlJobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some(FORWARD_FAILURE_MESSAGE));

    let stored = orch.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored, job);

    assert_eq!(engine.submissions().len(), 1, "exactly one attempt");
    assert_eq!(store.writes(), (1, 1));
}

#[tokio::test]
async fn rejected_and_timed_out_forward_calls_are_absorbed() {
    for outcome in [Outcome::Reject, Outcome::Timeout] {
        let (orch, _store, engine) = orchestrator(ScriptedEngine::new(outcome));

        let job = orch
            .submit(SubmitEtlJob::new("bad.csv", None))
            .await
            .unwrap();

        assert_eq!(job.status, EtlJobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some(FORWARD_FAILURE_MESSAGE));
        assert_eq!(engine.submissions().len(), 1);
    }
}

#[tokio::test]
async fn abandoned_submission_still_records_the_outcome() {
    let (orch, store, engine) = orchestrator(
        ScriptedEngine::new(Outcome::Timeout).with_submit_delay(Duration::from_millis(300)),
    );

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        orch.submit(SubmitEtlJob::new("slow.csv", None)),
    )
    .await;
    assert!(abandoned.is_err(), "caller gave up before the engine answered");

    tokio::time::sleep(Duration::from_millis(600)).await;

    let jobs = orch.list(None).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, EtlJobStatus::Failed);
    assert_eq!(jobs[0].error_message.as_deref(), Some(FORWARD_FAILURE_MESSAGE));
    assert_eq!(engine.submissions().len(), 1);
    assert_eq!(store.writes(), (1, 1));
}

#[tokio::test]
async fn missing_filename_creates_nothing_and_calls_nothing() {
    let (orch, store, engine) = orchestrator(ScriptedEngine::new(Outcome::Accept));

    for input in [SubmitEtlJob::default(), SubmitEtlJob::new("  ", None)] {
        let err = orch.submit(input).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "filename is required");
    }

    assert!(orch.list(None).await.unwrap().is_empty());
    assert!(engine.submissions().is_empty());
    assert_eq!(store.writes(), (0, 0));
}

#[tokio::test]
async fn submitted_ids_are_unique() {
    let (orch, _store, _engine) = orchestrator(ScriptedEngine::new(Outcome::Accept));

    let mut ids = HashSet::new();
    for i in 0..50 {
        let job = orch
            .submit(SubmitEtlJob::new(format!("file-{i}.csv"), None))
            .await
            .unwrap();
        assert!(ids.insert(job.id), "duplicate id {}", job.id);
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_unknown_job_is_none() {
    let (orch, _store, _engine) = orchestrator(ScriptedEngine::new(Outcome::Accept));
    assert!(orch.get(JobId::new_v4()).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_of_unknown_job_fails_before_network_call() {
    let (orch, _store, engine) = orchestrator(
        ScriptedEngine::new(Outcome::Accept).with_live_status(live("running", Some(10), None)),
    );

    let err = orch.get_status(JobId::new_v4()).await.unwrap_err();

    assert_matches!(err, CoreError::NotFound { entity: "Job", .. });
    assert!(err.to_string().contains("Job not found in database"));
    assert_eq!(engine.status_calls(), 0);
}

#[tokio::test]
async fn status_returns_engine_payload_unmodified() {
    let payload = live(
        "completed",
        Some(100),
        Some("Inserted 12 rows into clinical_measurements"),
    );
    let (orch, _store, engine) =
        orchestrator(ScriptedEngine::new(Outcome::Accept).with_live_status(payload.clone()));

    let job = orch
        .submit(SubmitEtlJob::new("patients.csv", None))
        .await
        .unwrap();
    let status = orch.get_status(job.id).await.unwrap();

    assert_eq!(status, payload);
    assert_eq!(engine.status_calls(), 1);

    // Live `completed` is never written back.
    let stored = orch.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EtlJobStatus::Running);
    assert!(stored.completed_at.is_none());
}

#[tokio::test]
async fn status_failure_is_wrapped_and_leaves_record_untouched() {
    let (orch, store, _engine) = orchestrator(ScriptedEngine::new(Outcome::Accept));

    let job = orch
        .submit(SubmitEtlJob::new("patients.csv", None))
        .await
        .unwrap();
    let before = orch.get(job.id).await.unwrap().unwrap();
    let writes_before = store.writes();

    let err = orch.get_status(job.id).await.unwrap_err();

    assert_matches!(err, CoreError::StatusUnavailable(EngineError::Transport(_)));
    let msg = err.to_string();
    assert!(msg.starts_with("Failed to get ETL job status: "), "got: {msg}");
    assert!(msg.contains("ECONNREFUSED"), "cause text missing: {msg}");

    assert_eq!(orch.get(job.id).await.unwrap().unwrap(), before);
    assert_eq!(store.writes(), writes_before);
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_filters_by_status() {
    let store = Arc::new(InMemoryJobStore::new());
    let accepting = EtlOrchestrator::new(store.clone(), Arc::new(ScriptedEngine::new(Outcome::Accept)));
    let failing = EtlOrchestrator::new(
        store.clone(),
        Arc::new(ScriptedEngine::new(Outcome::Unreachable)),
    );

    accepting.submit(SubmitEtlJob::new("a.csv", None)).await.unwrap();
    failing.submit(SubmitEtlJob::new("b.csv", None)).await.unwrap();
    accepting.submit(SubmitEtlJob::new("c.csv", None)).await.unwrap();

    let all = accepting.list(None).await.unwrap();
    assert_eq!(all.len(), 3);

    let running = accepting.list(Some(EtlJobStatus::Running)).await.unwrap();
    assert_eq!(running.len(), 2);
    assert!(running.iter().all(|j| j.status == EtlJobStatus::Running));

    let failed = accepting.list(Some(EtlJobStatus::Failed)).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].filename, "b.csv");

    assert!(accepting
        .list(Some(EtlJobStatus::Completed))
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_each_collaborator() {
    let (orch, _store, _engine) = orchestrator(ScriptedEngine::new(Outcome::Accept));
    let report = orch.health().await;
    assert!(report.is_healthy());

    let (orch, _store, _engine) = orchestrator(ScriptedEngine::new(Outcome::Unreachable));
    let report = orch.health().await;
    assert!(report.store_healthy);
    assert!(!report.engine_healthy);
    assert!(!report.is_healthy());
}
