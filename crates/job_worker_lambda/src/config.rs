use std::path::PathBuf;

use job_worker_core::log_paths::{LogFileNaming, UnknownFileNaming, DEFAULT_LOG_DIR};
use job_worker_core::log_record::{Severity, UnknownSeverity};
use thiserror::Error;

use crate::adapters::workload::{UnknownWorkload, WorkloadKind};
use crate::logging::LoggingConfig;

pub const LOG_DIR_ENV: &str = "WORKER_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "WORKER_LOG_LEVEL";
pub const LOG_FILE_NAMING_ENV: &str = "WORKER_LOG_FILE_NAMING";
pub const WORKLOAD_ENV: &str = "WORKER_WORKLOAD";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkerConfig {
    pub logging: LoggingConfig,
    pub workload: WorkloadKind,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WORKER_LOG_LEVEL is invalid")]
    LogLevel(#[source] UnknownSeverity),
    #[error("WORKER_LOG_FILE_NAMING is invalid")]
    FileNaming(#[source] UnknownFileNaming),
    #[error("WORKER_WORKLOAD is invalid")]
    Workload(#[source] UnknownWorkload),
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the worker settings through `lookup`; unset and blank variables
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_directory = read(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let minimum_level = read(LOG_LEVEL_ENV)
            .map(|value| value.parse::<Severity>())
            .transpose()
            .map_err(ConfigError::LogLevel)?
            .unwrap_or(Severity::Info);
        let file_naming = read(LOG_FILE_NAMING_ENV)
            .map(|value| value.parse::<LogFileNaming>())
            .transpose()
            .map_err(ConfigError::FileNaming)?
            .unwrap_or_default();
        let workload = read(WORKLOAD_ENV)
            .map(|value| value.parse::<WorkloadKind>())
            .transpose()
            .map_err(ConfigError::Workload)?
            .unwrap_or_default();

        Ok(Self {
            logging: LoggingConfig {
                log_directory,
                minimum_level,
                file_naming,
            },
            workload,
        })
    }
}
