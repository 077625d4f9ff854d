use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use job_worker_core::contract::{describe_error, PROCESS_REQUEST_ID};
use job_worker_core::log_paths::{log_file_path, LogFileNaming, DEFAULT_LOG_DIR};
use job_worker_core::log_record::Severity;
use thiserror::Error;
use tracing::{dispatcher, Dispatch, Metadata, Span};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use super::format::{severity_of, CorrelationLayer, RequestLineFormat, CRITICAL_TARGET};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_directory: PathBuf,
    pub minimum_level: Severity,
    pub file_naming: LogFileNaming,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from(DEFAULT_LOG_DIR),
            minimum_level: Severity::Info,
            file_naming: LogFileNaming::Fixed,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open log file {}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: InitError,
    },
}

/// Console and file sinks behind one formatter and one severity filter.
///
/// Cloning is cheap; every clone writes through the same sinks.
#[derive(Debug, Clone)]
pub struct LogFacade {
    dispatch: Dispatch,
    log_directory: PathBuf,
    log_file: PathBuf,
}

impl LogFacade {
    /// Builds the sinks without installing them as the global default.
    ///
    /// The log file is opened in append mode here, so an unwritable volume
    /// fails now rather than on the first job.
    pub fn build<W>(config: &LoggingConfig, console: W) -> Result<Self, LoggingError>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        fs::create_dir_all(&config.log_directory).map_err(|source| {
            LoggingError::CreateDirectory {
                path: config.log_directory.clone(),
                source,
            }
        })?;

        let started_at = Local::now().naive_local();
        let log_file = log_file_path(&config.log_directory, config.file_naming, started_at);
        let file_sink = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(config.file_naming.file_name(started_at))
            .build(&config.log_directory)
            .map_err(|source| LoggingError::OpenLogFile {
                path: log_file.clone(),
                source,
            })?;

        let format = RequestLineFormat;
        let minimum_level = config.minimum_level;
        let subscriber = Registry::default()
            .with(CorrelationLayer)
            .with(filter_fn(move |metadata: &Metadata<'_>| {
                metadata.is_span() || severity_of(metadata) >= minimum_level
            }))
            .with(
                fmt::layer()
                    .event_format(format)
                    .with_ansi(false)
                    .with_writer(console),
            )
            .with(
                fmt::layer()
                    .event_format(format)
                    .with_ansi(false)
                    .with_writer(file_sink),
            );

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log_directory: config.log_directory.clone(),
            log_file,
        })
    }

    pub fn bind(&self, correlation_id: impl Into<String>) -> RequestLogger {
        let correlation_id: Arc<str> = Arc::from(correlation_id.into());
        let span = dispatcher::with_default(&self.dispatch, || {
            tracing::info_span!("job", request_id = %correlation_id)
        });

        RequestLogger {
            dispatch: self.dispatch.clone(),
            correlation_id,
            span,
        }
    }

    /// Logger for lines that belong to the process rather than to a job.
    pub fn process_logger(&self) -> RequestLogger {
        self.bind(PROCESS_REQUEST_ID)
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Handle that tags every line with one correlation id.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    dispatch: Dispatch,
    correlation_id: Arc<str>,
    span: Span,
}

impl RequestLogger {
    /// Runs `f` with this logger's sinks and correlation id in scope, so
    /// plain `tracing` macros inside `f` are tagged as well.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, || self.span.in_scope(f))
    }

    pub fn log(&self, severity: Severity, message: impl Display) {
        let request_id = &*self.correlation_id;
        self.in_scope(|| match severity {
            Severity::Debug => tracing::debug!(request_id, "{message}"),
            Severity::Info => tracing::info!(request_id, "{message}"),
            Severity::Warning => tracing::warn!(request_id, "{message}"),
            Severity::Error => tracing::error!(request_id, "{message}"),
            Severity::Critical => {
                tracing::error!(target: CRITICAL_TARGET, request_id, "{message}")
            }
        });
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Display) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: impl Display) {
        self.log(Severity::Critical, message);
    }

    /// Logs `message` at error severity followed by the full cause chain.
    pub fn error_chain(&self, message: impl Display, error: &dyn std::error::Error) {
        self.error(format_args!("{message}: {}", describe_error(error)));
    }
}
