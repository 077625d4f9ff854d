use std::time::Instant;

use job_worker_core::contract::{correlation_id, describe_error, job_input, JobError, JobOutcome};
use serde_json::Value;

use super::panic_report::catch_panic;
use crate::adapters::workload::Workload;
use crate::logging::{LogFacade, RequestLogger};

pub const ENTRY_MESSAGE: &str = "Received job.";
pub const COMPLETION_MESSAGE: &str = "Job completed successfully.";

/// Runs one job and converts every failure into [`JobOutcome::Failure`].
///
/// Input errors, workload errors and workload panics are logged at error
/// severity with the job's correlation id and then reported in the returned
/// record. A panic also logs its location and stack backtrace. Nothing is
/// propagated to the runtime, so one bad job cannot take the worker process
/// down.
pub fn handle_job(job: &Value, facade: &LogFacade, workload: &dyn Workload) -> JobOutcome {
    let logger = facade.bind(correlation_id(job));
    let started_at = Instant::now();
    logger.info(ENTRY_MESSAGE);

    match run_job(job, &logger, workload) {
        Ok(output) => {
            logger.debug(format_args!(
                "Job finished in {} ms",
                started_at.elapsed().as_millis()
            ));
            logger.info(COMPLETION_MESSAGE);
            JobOutcome::success(output)
        }
        Err(error) => {
            logger.error_chain("Job failed", &error);
            JobOutcome::failure(describe_error(&error))
        }
    }
}

fn run_job(
    job: &Value,
    logger: &RequestLogger,
    workload: &dyn Workload,
) -> Result<Value, JobError> {
    let input = job_input(job)?;
    logger.debug(format_args!(
        "Extracted input: prompt={:?} seconds={} extra_keys={}",
        input.prompt,
        input.seconds,
        input.extra.len()
    ));

    logger
        .in_scope(|| catch_panic(|| workload.run(&input, logger)))
        .map_err(|report| {
            logger.error(&report);
            JobError::Panicked(report.message)
        })?
        .map_err(JobError::Workload)
}
