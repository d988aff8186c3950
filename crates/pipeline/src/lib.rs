//! ETL job orchestration on top of the `etl-core` collaborator traits.

pub mod orchestrator;

pub use orchestrator::{EtlOrchestrator, HealthReport};
