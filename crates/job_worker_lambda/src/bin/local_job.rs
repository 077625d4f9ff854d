use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use job_worker_core::log_paths::{LogFileNaming, DEFAULT_LOG_DIR, FIXED_LOG_FILE_NAME};
use job_worker_core::log_record::{lines_for_request, Severity};
use job_worker_lambda::adapters::workload::WorkloadKind;
use job_worker_lambda::config::{LOG_DIR_ENV, LOG_FILE_NAMING_ENV, LOG_LEVEL_ENV, WORKLOAD_ENV};
use job_worker_lambda::handlers::job::handle_job;
use job_worker_lambda::logging::{self, LoggingConfig};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "local_job",
    about = "Run one job through the worker handler without the serverless runtime",
    long_about = "Runs a single job record through the same handler and logging facade the\n\
                  deployed worker uses, then prints the outcome as JSON.\n\
                  With --grep-request, prints the log lines of one job instead."
)]
struct Cli {
    /// Job record as inline JSON, e.g. '{"id":"abc","input":{"prompt":"hi"}}'
    #[arg(long, conflicts_with = "job_file")]
    job: Option<String>,
    /// Path to a JSON file holding the job record
    #[arg(long)]
    job_file: Option<PathBuf>,
    /// Directory receiving the log file
    #[arg(long, env = LOG_DIR_ENV, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
    /// Minimum severity written to both sinks
    #[arg(long, env = LOG_LEVEL_ENV, default_value = "info")]
    log_level: Severity,
    /// Log file naming: fixed or per_start
    #[arg(long, env = LOG_FILE_NAMING_ENV, default_value = "fixed")]
    file_naming: LogFileNaming,
    /// Workload run for the job: echo or log_levels
    #[arg(long, env = WORKLOAD_ENV, default_value = "echo")]
    workload: WorkloadKind,
    /// Print every logged line of this request id and exit
    #[arg(long, conflicts_with_all = ["job", "job_file"])]
    grep_request: Option<String>,
    /// Log file searched by --grep-request (defaults to <log-dir>/worker.log)
    #[arg(long, requires = "grep_request")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(request_id) = cli.grep_request.as_deref() {
        let path = cli
            .log_file
            .clone()
            .unwrap_or_else(|| cli.log_dir.join(FIXED_LOG_FILE_NAME));
        return grep_request(&path, request_id, &mut io::stdout().lock());
    }

    let job = read_job(&cli)?;
    let facade = logging::initialize(&LoggingConfig {
        log_directory: cli.log_dir.clone(),
        minimum_level: cli.log_level,
        file_naming: cli.file_naming,
    })?;

    let outcome = handle_job(&job, &facade, cli.workload.workload());
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn read_job(cli: &Cli) -> anyhow::Result<Value> {
    match (&cli.job, &cli.job_file) {
        (Some(text), _) => serde_json::from_str(text).context("--job is not valid JSON"),
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read job file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("job file {} is not valid JSON", path.display()))
        }
        (None, None) => bail!("one of --job, --job-file or --grep-request is required"),
    }
}

/// Writes every line of `path` logged for `request_id` to `out`.
fn grep_request(path: &Path, request_id: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read log file {}", path.display()))?;
    for line in lines_for_request(&contents, request_id) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grep_request_prints_only_matching_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(FIXED_LOG_FILE_NAME);
        fs::write(
            &path,
            "2026-02-14 07:05:03 - INFO - [Request: abc] - Received job.\n\
             2026-02-14 07:05:03 - INFO - [Request: other] - Received job.\n\
             2026-02-14 07:05:04 - ERROR - [Request: abc] - Job failed: upstream said:\n\
             2026-02-14 07:05:04 - ERROR - [Request: abc] - timeout after 30s\n\
             stray stderr output\n",
        )
        .expect("write log file");

        let mut out = Vec::new();
        grep_request(&path, "abc", &mut out).expect("grep should succeed");

        let printed = String::from_utf8(out).expect("utf-8 output");
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.contains("[Request: abc]")));
        assert!(lines[2].ends_with("timeout after 30s"));
    }

    #[test]
    fn grep_request_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = grep_request(&dir.path().join("absent.log"), "abc", &mut Vec::new())
            .expect_err("missing file should fail");
        assert!(error.to_string().starts_with("failed to read log file "));
    }
}
