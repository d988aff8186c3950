//! HTTP client for the external ETL processing engine.
//!
//! Implements [`etl_core::engine::EtlEngine`] over the engine's REST
//! contract (`POST /jobs`, `GET /jobs/{id}/status`, `GET /health`).

pub mod api;

pub use api::EtlEngineApi;
