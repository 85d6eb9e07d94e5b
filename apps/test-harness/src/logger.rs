//! In-memory log sink
//!
//! Collects `log` records from the shading stage so a harness run can be
//! inspected or dumped after the fact.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Global capture buffer
static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

static LOGGER: CaptureLogger = CaptureLogger;

/// Logger that appends every enabled record to a shared buffer
pub struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
            LINES.lock().push(line);
        }
    }

    fn flush(&self) {}
}

/// Install the capture logger. Fails if another logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Drain the captured lines
pub fn take_lines() -> Vec<String> {
    core::mem::take(&mut *LINES.lock())
}
