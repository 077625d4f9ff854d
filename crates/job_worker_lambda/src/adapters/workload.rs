use std::str::FromStr;

use job_worker_core::contract::JobInput;
use serde_json::Value;
use thiserror::Error;

use crate::logging::RequestLogger;

pub const LOG_LEVELS_RESULT: &str = "Successfully demonstrated all log levels.";

/// The unit of work a job runs once its input has been extracted.
pub trait Workload: Send + Sync {
    fn run(&self, input: &JobInput, logger: &RequestLogger) -> Result<Value, String>;
}

/// Placeholder workload: echoes the prompt back as the job output.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoWorkload;

impl Workload for EchoWorkload {
    fn run(&self, input: &JobInput, logger: &RequestLogger) -> Result<Value, String> {
        logger.debug(format_args!("Echoing prompt (seconds={})", input.seconds));
        Ok(input.prompt.clone().map(Value::String).unwrap_or(Value::Null))
    }
}

/// Emits one line at every severity, for checking sink and level wiring on a
/// freshly deployed worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLevelsWorkload;

impl Workload for LogLevelsWorkload {
    fn run(&self, _input: &JobInput, logger: &RequestLogger) -> Result<Value, String> {
        logger.debug("Debug: detailed information for diagnosing problems.");
        logger.info("Info: general information about program execution.");
        logger.warning("Warning: something unexpected happened, but the job continues.");
        logger.error("Error: a serious but recoverable problem.");
        logger.critical("Critical: a very serious, potentially unrecoverable problem.");
        Ok(Value::String(LOG_LEVELS_RESULT.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkloadKind {
    #[default]
    Echo,
    LogLevels,
}

impl WorkloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::LogLevels => "log_levels",
        }
    }

    pub fn workload(self) -> &'static dyn Workload {
        match self {
            Self::Echo => &EchoWorkload,
            Self::LogLevels => &LogLevelsWorkload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workload `{0}` (expected echo or log_levels)")]
pub struct UnknownWorkload(pub String);

impl FromStr for WorkloadKind {
    type Err = UnknownWorkload;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "echo" => Ok(Self::Echo),
            "log_levels" | "log-levels" => Ok(Self::LogLevels),
            _ => Err(UnknownWorkload(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use job_worker_core::contract::job_input;
    use job_worker_core::log_record::Severity;
    use serde_json::json;

    use super::*;
    use crate::test_support::{capture_facade, file_records};

    #[test]
    fn echo_returns_prompt_or_null() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (facade, _console) = capture_facade(dir.path(), Severity::Info);
        let logger = facade.bind("abc");

        let input = job_input(&json!({"input": {"prompt": "hi"}})).expect("input");
        assert_eq!(EchoWorkload.run(&input, &logger), Ok(json!("hi")));

        let empty = job_input(&json!({"input": {}})).expect("input");
        assert_eq!(EchoWorkload.run(&empty, &logger), Ok(Value::Null));
    }

    #[test]
    fn log_levels_emits_each_severity_once() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (facade, _console) = capture_facade(dir.path(), Severity::Debug);
        let logger = facade.bind("levels");

        let input = job_input(&json!({})).expect("input");
        let output = LogLevelsWorkload
            .run(&input, &logger)
            .expect("workload should succeed");
        assert_eq!(output, json!(LOG_LEVELS_RESULT));

        let severities: Vec<Severity> = file_records(&facade)
            .into_iter()
            .map(|record| record.severity)
            .collect();
        assert_eq!(severities, Severity::ALL.to_vec());
    }

    #[test]
    fn workload_kind_parses_config_values() {
        assert_eq!("echo".parse(), Ok(WorkloadKind::Echo));
        assert_eq!("LOG-LEVELS".parse(), Ok(WorkloadKind::LogLevels));
        assert!("sleep".parse::<WorkloadKind>().is_err());
    }
}
