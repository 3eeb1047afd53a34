//! benchtrail - benchmark history and regression detection for CI
//!
//! Ingests raw benchmark tool output, appends it to a per-branch,
//! append-only history, and flags metrics that worsened beyond a threshold.
//!
//! This library provides:
//! - [`normalize`]: Tool output parsing into canonical runs
//! - [`store`]: Per-branch history persistence
//! - [`detect`]: Regression detection against the last observation
//! - [`publish`]: Canonical serialization and alert sinks
//! - [`ingest`]: The end-to-end ingestion pipeline
//! - [`config`]: Layered configuration
//! - [`cli`]: Command-line arguments
//! - [`model`]: Domain models

pub mod cli;
pub mod config;
pub mod constants;
pub mod detect;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod publish;
pub mod store;
