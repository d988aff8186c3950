#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use etl_core::engine::{EngineError, EngineJobStatus, EngineSubmission, EtlEngine};
use etl_core::types::JobId;
use etl_db::InMemoryJobStore;
use etl_pipeline::EtlOrchestrator;
use http_body_util::BodyExt;
use tower::ServiceExt;

use etl_api::config::ServerConfig;
use etl_api::router::build_app_router;
use etl_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        etl_service_url: "http://etl.test:8000".to_string(),
        etl_engine_timeout_secs: 5,
        database_url: None,
    }
}

/// Engine double: accepts or refuses submissions, answers status with a
/// fixed JSON payload (or fails when none is set).
pub struct StubEngine {
    pub accept: bool,
    pub submit_delay: Duration,
    pub live_status: Option<serde_json::Value>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl StubEngine {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            submit_delay: Duration::ZERO,
            live_status: None,
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn refusing() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    /// Answer submissions only after `delay`, like an engine that is slow to
    /// accept or to time out.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn with_live_status(mut self, payload: serde_json::Value) -> Self {
        self.live_status = Some(payload);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EtlEngine for StubEngine {
    async fn submit_job(&self, _submission: &EngineSubmission) -> Result<(), EngineError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.submit_delay).await;
        if self.accept {
            Ok(())
        } else {
            Err(EngineError::Timeout)
        }
    }

    async fn job_status(&self, _job_id: JobId) -> Result<EngineJobStatus, EngineError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match &self.live_status {
            Some(payload) => serde_json::from_value(payload.clone())
                .map_err(|e| EngineError::Decode(e.to_string())),
            None => Err(EngineError::Api {
                status: 503,
                body: "engine overloaded".into(),
            }),
        }
    }

    async fn health(&self) -> Result<(), EngineError> {
        if self.accept {
            Ok(())
        } else {
            Err(EngineError::Transport("connection refused".into()))
        }
    }
}

/// Build the full application router over an in-memory store and the given
/// engine double, using the same middleware stack as production.
pub fn build_test_app(engine: Arc<StubEngine>) -> Router {
    build_test_app_with(engine, test_config()).0
}

/// Like [`build_test_app`] with a custom config, also handing back the store
/// so tests can inspect records the HTTP surface did not return.
pub fn build_test_app_with(
    engine: Arc<StubEngine>,
    config: ServerConfig,
) -> (Router, Arc<InMemoryJobStore>) {
    let store = Arc::new(InMemoryJobStore::new());
    let state = AppState {
        orchestrator: Arc::new(EtlOrchestrator::new(store.clone(), engine)),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), store)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
