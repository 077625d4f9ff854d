use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FIELD_SEPARATOR: &str = " - ";
const REQUEST_OPEN: &str = "[Request: ";
const REQUEST_CLOSE: &str = "]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity `{0}` (expected debug, info, warning, error or critical)")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            _ => Err(UnknownSeverity(value.to_string())),
        }
    }
}

/// One rendered log line.
///
/// Format: `2026-01-30 08:14:09 - INFO - [Request: abc] - message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub severity: Severity,
    pub correlation_id: String,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{REQUEST_OPEN}{}{REQUEST_CLOSE}{FIELD_SEPARATOR}{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.severity,
            self.correlation_id,
            self.message,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRecordError {
    #[error("log line is missing the `{0}` field")]
    MissingField(&'static str),
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error(transparent)]
    Severity(#[from] UnknownSeverity),
}

impl FromStr for LogRecord {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.splitn(4, FIELD_SEPARATOR);

        let timestamp = fields
            .next()
            .ok_or(ParseRecordError::MissingField("timestamp"))?;
        let severity = fields
            .next()
            .ok_or(ParseRecordError::MissingField("level"))?;
        let request = fields
            .next()
            .and_then(|value| value.strip_prefix(REQUEST_OPEN))
            .and_then(|value| value.strip_suffix(REQUEST_CLOSE))
            .ok_or(ParseRecordError::MissingField("request"))?;
        let message = fields
            .next()
            .ok_or(ParseRecordError::MissingField("message"))?;

        Ok(Self {
            timestamp: NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)?,
            severity: severity.parse()?,
            correlation_id: request.to_string(),
            message: message.to_string(),
        })
    }
}

/// Returns the lines of `contents` that were logged for `correlation_id`.
///
/// Lines that do not parse as records (foreign output, stray stderr text)
/// are skipped.
pub fn lines_for_request<'a>(
    contents: &'a str,
    correlation_id: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    contents.lines().filter(move |line| {
        line.parse::<LogRecord>()
            .map(|record| record.correlation_id == correlation_id)
            .unwrap_or(false)
    })
}
