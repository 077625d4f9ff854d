//! Serverless runtime integration for the job worker.
//!
//! This crate owns the logging facade, the job handler, workload adapters and
//! environment configuration. Contract types and log formats come from
//! `job_worker_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;
