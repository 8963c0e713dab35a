//! Test utilities for dotxt.
//!
//! Parsing resolves relative dates against "now", so tests pin the
//! clock to a fixed instant instead of the wall clock.

#[cfg(test)]
use chrono::NaiveDateTime;

/// A fixed "now" for deterministic parsing in tests:
/// 2026-03-01T12-00.
#[cfg(test)]
pub fn fixed_now() -> NaiveDateTime {
    crate::time::parse_absolute("2026-03-01T12-00").expect("valid fixed timestamp")
}
