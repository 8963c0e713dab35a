//! Process-wide error taxonomy.
//!
//! Parsing a task line never produces an `Error`: bad tokens revert to
//! plain text and are reported as diagnostics. Errors are reserved for
//! operations that target something specific (a task id, a token, a
//! list) and for CLI/config failures.

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong outside of per-token parse recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input had no non-whitespace content.
    EmptyText,
    /// Structural failure in the mini-language or in a date, duration,
    /// or progress literal.
    Parse(String),
    /// Structurally parseable but out of domain (empty progress unit,
    /// whitespace in a priority, config value out of range).
    Value(String),
    /// Reference to a missing task id, token, or list.
    NotFound(String),
    /// CLI usage error (missing positional, bad flag).
    Args(String),
    /// An operation targeted a list the store has not loaded.
    ListNotInMemory(String),
    /// Configuration error (wraps a value or type mismatch).
    Conf(String),
    /// I/O failure at the file boundary.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => write!(f, "empty text"),
            Self::Parse(msg) => write!(f, "parse error: {}", msg),
            Self::Value(msg) => write!(f, "value error: {}", msg),
            Self::NotFound(msg) => write!(f, "not found: {}", msg),
            Self::Args(msg) => write!(f, "usage error: {}", msg),
            Self::ListNotInMemory(msg) => write!(f, "list not in memory: {}", msg),
            Self::Conf(msg) => write!(f, "config error: {}", msg),
            Self::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
