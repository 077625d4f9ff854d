//! Request-correlated logging facade.
//!
//! One `tracing` subscriber fans every event out to two sinks, standard output
//! and an append-only file under the configured log directory. Both sinks share
//! the [`RequestLineFormat`] formatter:
//!
//! ```text
//! 2026-02-14 08:14:09 - INFO - [Request: abc] - Received job.
//! ```
//!
//! [`initialize`] installs the facade once per process. Handlers call
//! [`LogFacade::bind`] per job and pass the returned [`RequestLogger`] down the
//! call path.

mod facade;
mod format;

use std::sync::{Mutex, PoisonError};

use tracing::dispatcher;

pub use facade::{LogFacade, LoggingConfig, LoggingError, RequestLogger};
pub use format::{
    severity_of, CorrelationLayer, RequestLineFormat, CRITICAL_TARGET, REQUEST_ID_FIELD,
};

static INSTALLED: Mutex<Option<LogFacade>> = Mutex::new(None);

/// Builds the process-wide facade on first use and returns it afterwards.
///
/// Repeated calls never attach another pair of sinks. A later call with a
/// different configuration keeps the first one and logs a warning.
pub fn initialize(config: &LoggingConfig) -> Result<LogFacade, LoggingError> {
    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(facade) = installed.as_ref() {
        if facade.log_directory() != config.log_directory {
            facade.process_logger().warning(format_args!(
                "Logging already initialized in {}; ignoring {}",
                facade.log_directory().display(),
                config.log_directory.display(),
            ));
        }
        return Ok(facade.clone());
    }

    let facade = LogFacade::build(config, std::io::stdout)?;
    if dispatcher::set_global_default(facade.dispatch().clone()).is_err() {
        facade
            .process_logger()
            .warning("A global tracing subscriber was already set; only bound loggers use this facade");
    }

    *installed = Some(facade.clone());
    Ok(facade)
}
