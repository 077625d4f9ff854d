pub mod job;
pub mod panic_report;
