//! Shared job worker domain primitives.
//!
//! This crate owns the job contract, outcome records, and the log line and
//! log file formats. It intentionally excludes the serverless runtime and the
//! tracing subscriber; those live in `job_worker_lambda`.

pub mod contract;
pub mod log_paths;
pub mod log_record;
