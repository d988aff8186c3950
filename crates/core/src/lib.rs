//! Domain types and collaborator contracts for the ETL job orchestrator.
//!
//! Everything here is transport- and storage-agnostic: the [`store::JobStore`]
//! and [`engine::EtlEngine`] traits are implemented by `etl-db` and
//! `etl-engine` respectively, and consumed by `etl-pipeline`.

pub mod engine;
pub mod error;
pub mod etl_job;
pub mod store;
pub mod types;
