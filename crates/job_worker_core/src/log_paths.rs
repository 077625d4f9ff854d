use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

pub const DEFAULT_LOG_DIR: &str = "/runpod-volume/logs";
pub const FIXED_LOG_FILE_NAME: &str = "worker.log";

const PER_START_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFileNaming {
    /// `worker.log`, appended to by every process that runs against the
    /// same directory.
    #[default]
    Fixed,
    /// `worker_<YYYYmmdd_HHMMSS>.log`, one file per process start.
    PerStart,
}

impl LogFileNaming {
    pub fn file_name(self, started_at: NaiveDateTime) -> String {
        match self {
            Self::Fixed => FIXED_LOG_FILE_NAME.to_string(),
            Self::PerStart => format!("worker_{}.log", started_at.format(PER_START_STAMP_FORMAT)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log file naming `{0}` (expected fixed or per_start)")]
pub struct UnknownFileNaming(pub String);

impl FromStr for LogFileNaming {
    type Err = UnknownFileNaming;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "per_start" | "per-start" => Ok(Self::PerStart),
            _ => Err(UnknownFileNaming(value.to_string())),
        }
    }
}

pub fn log_file_path(
    log_directory: &Path,
    naming: LogFileNaming,
    started_at: NaiveDateTime,
) -> PathBuf {
    log_directory.join(naming.file_name(started_at))
}
