use job_worker_core::contract::{describe_error, JobOutcome};
use job_worker_lambda::adapters::workload::Workload;
use job_worker_lambda::config::WorkerConfig;
use job_worker_lambda::handlers::job::handle_job;
use job_worker_lambda::logging::{self, LogFacade};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    facade: &LogFacade,
    workload: &dyn Workload,
) -> Result<JobOutcome, Error> {
    Ok(handle_job(&event.payload, facade, workload))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = WorkerConfig::from_env().map_err(|error| Error::from(describe_error(&error)))?;
    let facade =
        logging::initialize(&config.logging).map_err(|error| Error::from(describe_error(&error)))?;

    let workload = config.workload.workload();
    facade.process_logger().info(format_args!(
        "Logger initialized (file={}, workload={}). Ready to process jobs.",
        facade.log_file().display(),
        config.workload.as_str(),
    ));

    let facade = &facade;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, facade, workload).await
    }))
    .await
}
