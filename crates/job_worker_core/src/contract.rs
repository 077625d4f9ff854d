use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Correlation id used for jobs that arrive without an `id`.
pub const UNKNOWN_REQUEST_ID: &str = "unknown";
/// Correlation id used for lines logged outside of any job.
pub const PROCESS_REQUEST_ID: &str = "N/A";
pub const DEFAULT_SECONDS: f64 = 0.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobInput {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default = "default_seconds")]
    pub seconds: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JobOutcome {
    Success { output: Value },
    Failure { error: String },
}

impl JobOutcome {
    pub fn success(output: impl Into<Value>) -> Self {
        Self::Success {
            output: output.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid job input")]
    InvalidInput(#[source] serde_json::Error),
    #[error("job input must be a JSON object")]
    InputNotObject,
    #[error("workload failed: {0}")]
    Workload(String),
    #[error("workload panicked: {0}")]
    Panicked(String),
}

/// Renders an error and every `source()` below it as `outer: inner: root`.
///
/// Trailing `.` or `:` on an outer message is dropped before its cause is
/// appended.
pub fn describe_error(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let kept = message.trim_end_matches(['.', ':', ' ']).len();
        message.truncate(kept);
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub fn default_seconds() -> f64 {
    DEFAULT_SECONDS
}

/// Derives the correlation id for a raw job record.
///
/// Non-empty string ids are used as-is and numeric ids are stringified.
/// Anything else falls back to [`UNKNOWN_REQUEST_ID`].
pub fn correlation_id(job: &Value) -> String {
    match job.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => UNKNOWN_REQUEST_ID.to_string(),
    }
}

/// Extracts the typed input of a raw job record.
///
/// A missing or `null` `input` is the same as an empty object, so every
/// documented default applies.
pub fn job_input(job: &Value) -> Result<JobInput, JobError> {
    match job.get("input") {
        None | Some(Value::Null) => Ok(JobInput::default_values()),
        Some(value @ Value::Object(_)) => {
            JobInput::deserialize(value).map_err(JobError::InvalidInput)
        }
        Some(_) => Err(JobError::InputNotObject),
    }
}

impl JobInput {
    fn default_values() -> Self {
        Self {
            prompt: None,
            seconds: DEFAULT_SECONDS,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn correlation_id_uses_job_id() {
        assert_eq!(correlation_id(&json!({"id": "abc"})), "abc");
        assert_eq!(correlation_id(&json!({"id": 42})), "42");
    }

    #[test]
    fn correlation_id_falls_back_to_sentinel() {
        assert_eq!(correlation_id(&json!({"input": {}})), UNKNOWN_REQUEST_ID);
        assert_eq!(correlation_id(&json!({"id": "  "})), UNKNOWN_REQUEST_ID);
        assert_eq!(correlation_id(&json!({"id": null})), UNKNOWN_REQUEST_ID);
        assert_eq!(correlation_id(&json!("not-an-object")), UNKNOWN_REQUEST_ID);
    }

    #[test]
    fn job_input_applies_defaults_for_missing_keys() {
        let input = job_input(&json!({"id": "abc", "input": {}})).expect("input should parse");
        assert_eq!(input.prompt, None);
        assert_eq!(input.seconds, 0.0);
        assert!(input.extra.is_empty());

        let missing = job_input(&json!({"id": "abc"})).expect("missing input should parse");
        assert_eq!(missing.seconds, DEFAULT_SECONDS);
    }

    #[test]
    fn job_input_keeps_unknown_keys() {
        let input = job_input(&json!({
            "id": "abc",
            "input": {"prompt": "hi", "seconds": 2, "temperature": 0.5}
        }))
        .expect("input should parse");

        assert_eq!(input.prompt.as_deref(), Some("hi"));
        assert_eq!(input.seconds, 2.0);
        assert_eq!(input.extra.get("temperature"), Some(&json!(0.5)));
    }

    #[test]
    fn job_input_rejects_mistyped_fields() {
        let error = job_input(&json!({"id": "abc", "input": {"seconds": "two"}}))
            .expect_err("string seconds should fail");
        assert!(matches!(error, JobError::InvalidInput(_)));

        let error = job_input(&json!({"id": "abc", "input": [1, 2]}))
            .expect_err("array input should fail");
        assert!(matches!(error, JobError::InputNotObject));
    }

    #[test]
    fn describe_error_includes_source_chain() {
        let error = job_input(&json!({"input": {"seconds": "two"}}))
            .expect_err("string seconds should fail");
        let message = describe_error(&error);
        assert!(message.starts_with("invalid job input: "));
        assert!(message.contains("invalid type"));
    }

    #[derive(Debug, Error)]
    #[error("upstream request failed.")]
    struct UpstreamError(#[source] std::io::Error);

    #[test]
    fn describe_error_does_not_double_punctuation() {
        let error = UpstreamError(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out after 30s.",
        ));
        assert_eq!(
            describe_error(&error),
            "upstream request failed: timed out after 30s."
        );
    }

    #[test]
    fn outcome_serializes_to_runtime_shapes() {
        assert_eq!(
            serde_json::to_value(JobOutcome::success("hi")).expect("serialize success"),
            json!({"output": "hi"})
        );
        assert_eq!(
            serde_json::to_value(JobOutcome::failure("boom")).expect("serialize failure"),
            json!({"error": "boom"})
        );
    }
}
