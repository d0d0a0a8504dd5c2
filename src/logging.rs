//! Log sink for the `log` facade.
//!
//! Library modules only call `log::debug!` and friends. The binary installs
//! [`init`], which writes enabled records to stderr and, when asked, appends
//! one plain-text line per record to a log file:
//!
//! ```text
//! 2026-03-14T09:26:53.589+00:00 [INFO] aspect_sort::engine: Classifying 12 files into out
//! ```
//!
//! The file is a side artifact. Opening it can fail `init`; a failed write
//! is dropped silently.

use chrono::{DateTime, SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogInitError {
    #[error("Cannot open log file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("A logger is already installed")]
    AlreadySet(#[from] log::SetLoggerError),
}

pub struct Logger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl Logger {
    /// A logger writing to stderr and, if given, appending to `log_file`.
    pub fn new(level: LevelFilter, log_file: Option<&Path>) -> Result<Self, LogInitError> {
        let file = log_file
            .map(|path| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map(Mutex::new)
                    .map_err(|source| LogInitError::Open {
                        path: path.to_path_buf(),
                        source,
                    })
            })
            .transpose()?;
        Ok(Self { level, file })
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{}] {}", record.level(), record.args());
        if let Some(file) = &self.file {
            let line = format_line(Utc::now(), record);
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{line}");
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// `<RFC3339 timestamp> [LEVEL] target: message`
pub fn format_line(timestamp: DateTime<Utc>, record: &Record) -> String {
    format!(
        "{} [{}] {}: {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
        record.level(),
        record.target(),
        record.args()
    )
}

/// Install the global logger. Can succeed once per process.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<(), LogInitError> {
    let logger = Logger::new(level, log_file)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

/// Map a `-v` count onto a level: warnings by default, then info, then debug.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}
