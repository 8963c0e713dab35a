//! Leveled logging with a console and a file sink.
//!
//! Thresholds come from `logging.console-level` and
//! `logging.file-level` (`-1` disables a sink, `5` is the noisiest).
//! Console output goes to stderr so rendered lists stay clean on
//! stdout. The file sink appends to `<config>/dotxt.log` and rotates
//! when the file grows past a line cap.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use once_cell::sync::OnceCell;

/// Maximum number of lines before the log file rotates.
pub const DEFAULT_MAX_LINES: usize = 5000;

/// Log severity. Numeric values match the config's `-1..5` scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Verbose = 3,
    Debug = 4,
    Trace = 5,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }
}

/// A logger with independent console and file thresholds.
#[derive(Debug)]
pub struct Logger {
    console_level: i32,
    file_level: i32,
    path: Option<PathBuf>,
    max_lines: usize,
    // File writes are serialized; tests may log from parallel threads.
    file_lock: Mutex<()>,
}

impl Logger {
    pub fn new(console_level: i32, file_level: i32, path: Option<PathBuf>) -> Self {
        Self {
            console_level,
            file_level,
            path,
            max_lines: DEFAULT_MAX_LINES,
            file_lock: Mutex::new(()),
        }
    }

    pub fn log(&self, level: Level, message: &str) {
        let severity = level as i32;
        if self.console_level >= 0 && severity <= self.console_level {
            eprintln!("{} {}", level.label(), message);
        }
        if self.file_level >= 0 && severity <= self.file_level {
            if let Some(path) = &self.path {
                let _guard = self.file_lock.lock().unwrap_or_else(|e| e.into_inner());
                if let Err(e) = append_line(path, level, message, self.max_lines) {
                    eprintln!("WARN failed to write log: {}", e);
                }
            }
        }
    }
}

fn append_line(path: &Path, level: Level, message: &str, max_lines: usize) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let line = format!("{} | {} | {}\n", timestamp, level.label(), message);

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()?;

    rotate_if_needed(path, max_lines)
}

/// Rotate the log to a timestamped `.bak` when it exceeds `max_lines`.
fn rotate_if_needed(path: &Path, max_lines: usize) -> std::io::Result<()> {
    if count_lines(path)? <= max_lines {
        return Ok(());
    }
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let backup_name = format!(
        "{}.{}.bak",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("log"),
        timestamp
    );
    fs::rename(path, path.with_file_name(backup_name))?;
    File::create(path)?;
    Ok(())
}

fn count_lines(path: &Path) -> std::io::Result<usize> {
    let file = File::open(path)?;
    Ok(BufReader::new(file).lines().count())
}

static LOGGER: OnceCell<Logger> = OnceCell::new();

/// Install the process logger. Later calls are no-ops.
pub fn init(console_level: i32, file_level: i32, path: Option<PathBuf>) {
    let _ = LOGGER.set(Logger::new(console_level, file_level, path));
}

fn with_logger(level: Level, message: &str) {
    if let Some(logger) = LOGGER.get() {
        logger.log(level, message);
    }
}

pub fn error(message: &str) {
    with_logger(Level::Error, message);
}

pub fn warn(message: &str) {
    with_logger(Level::Warn, message);
}

pub fn info(message: &str) {
    with_logger(Level::Info, message);
}

pub fn debug(message: &str) {
    with_logger(Level::Debug, message);
}

pub fn trace(message: &str) {
    with_logger(Level::Trace, message);
}
