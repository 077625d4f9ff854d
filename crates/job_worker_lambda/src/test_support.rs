use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use job_worker_core::log_record::{LogRecord, Severity};
use tracing_subscriber::fmt::MakeWriter;

use crate::logging::{LogFacade, LoggingConfig};

/// In-memory console sink shared between the facade and the test.
#[derive(Debug, Clone, Default)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().expect("poisoned mutex");
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("poisoned mutex")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub fn capture_facade(log_directory: &Path, minimum_level: Severity) -> (LogFacade, CaptureWriter) {
    let console = CaptureWriter::default();
    let config = LoggingConfig {
        log_directory: log_directory.to_path_buf(),
        minimum_level,
        ..LoggingConfig::default()
    };
    let facade = LogFacade::build(&config, console.clone()).expect("facade should build");
    (facade, console)
}

pub fn file_records(facade: &LogFacade) -> Vec<LogRecord> {
    std::fs::read_to_string(facade.log_file())
        .expect("log file should be readable")
        .lines()
        .map(|line| line.parse().expect("every line should be a log record"))
        .collect()
}
