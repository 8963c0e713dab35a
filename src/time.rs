//! Absolute datetime and compact duration codec.
//!
//! Datetimes on disk use the dash-only form `YYYY-MM-DDTHH-MM` (minute
//! precision) or `YYYY-MM-DDTHH-MM-SS`, so a value never contains a
//! character that the tokenizer would split on. Durations are signed
//! concatenations of `N<unit>` pairs (`1y2m3w4d5h6M7S`); the formatter
//! has two modes: an exact form that round-trips through the parser and
//! a compact human form used for display.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Seconds per unit. Months and years are fixed-width (30 and 365 days).
pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;
pub const WEEK: i64 = 7 * DAY;
pub const MONTH: i64 = 30 * DAY;
pub const YEAR: i64 = 365 * DAY;

/// Current wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    let t = Local::now().naive_local();
    t.with_nanosecond(0).unwrap_or(t)
}

/// Parse `YYYY-MM-DDTHH-MM` or `YYYY-MM-DDTHH-MM-SS`.
///
/// Exactly one `T` and 3 or 4 dashes total; any other shape fails.
pub fn parse_absolute(s: &str) -> Result<NaiveDateTime> {
    let dash_count = s.matches('-').count();
    if s.matches('T').count() != 1 || (dash_count != 3 && dash_count != 4) {
        return Err(Error::Parse(format!("malformed datetime: {}", s)));
    }

    let (date_part, time_part) = s
        .split_once('T')
        .ok_or_else(|| Error::Parse(format!("malformed datetime: {}", s)))?;

    let date_fields: Vec<&str> = date_part.split('-').collect();
    if date_fields.len() != 3 {
        return Err(Error::Parse(format!("malformed date: {}", date_part)));
    }
    let time_fields: Vec<&str> = time_part.split('-').collect();
    if time_fields.len() != 2 && time_fields.len() != 3 {
        return Err(Error::Parse(format!("malformed time: {}", time_part)));
    }

    let num = |field: &str| -> Result<u32> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Parse(format!("bad datetime field: {:?}", field)));
        }
        field
            .parse()
            .map_err(|_| Error::Parse(format!("bad datetime field: {:?}", field)))
    };

    let year = num(date_fields[0])? as i32;
    let month = num(date_fields[1])?;
    let day = num(date_fields[2])?;
    let hour = num(time_fields[0])?;
    let minute = num(time_fields[1])?;
    let second = if time_fields.len() == 3 {
        num(time_fields[2])?
    } else {
        0
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::Parse(format!("no such date: {}", date_part)))?;
    date.and_hms_opt(hour, minute, second)
        .ok_or_else(|| Error::Parse(format!("no such time: {}", time_part)))
}

/// Format a datetime in the dash-only absolute form.
///
/// Seconds are appended only when non-zero, matching what the minute
/// precision variant parses back to.
pub fn format_absolute(t: NaiveDateTime) -> String {
    if t.second() == 0 {
        format!(
            "{:04}-{:02}-{:02}T{:02}-{:02}",
            t.year(),
            t.month(),
            t.day(),
            t.hour(),
            t.minute()
        )
    } else {
        format!(
            "{:04}-{:02}-{:02}T{:02}-{:02}-{:02}",
            t.year(),
            t.month(),
            t.day(),
            t.hour(),
            t.minute(),
            t.second()
        )
    }
}

/// Parse a duration literal into seconds.
///
/// A signed concatenation of `N<unit>` pairs where unit is one of
/// `y m w d h M S`. Units may repeat and appear in any order; values
/// accumulate. Trailing digits without a unit fail.
pub fn parse_duration(s: &str) -> Result<i64> {
    let (sign, body) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => (1, s),
    };
    if body.is_empty() {
        return Err(Error::Parse(format!("empty duration: {:?}", s)));
    }

    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in body.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(Error::Parse(format!("duration unit without count: {}", s)));
        }
        let n: i64 = digits
            .parse()
            .map_err(|_| Error::Parse(format!("duration count overflow: {}", s)))?;
        let unit = match c {
            'y' => YEAR,
            'm' => MONTH,
            'w' => WEEK,
            'd' => DAY,
            'h' => HOUR,
            'M' => MINUTE,
            'S' => 1,
            _ => return Err(Error::Parse(format!("unknown duration unit {:?} in {}", c, s))),
        };
        total = total
            .checked_add(n.checked_mul(unit).ok_or_else(|| {
                Error::Parse(format!("duration overflow: {}", s))
            })?)
            .ok_or_else(|| Error::Parse(format!("duration overflow: {}", s)))?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(Error::Parse(format!("trailing digits without unit: {}", s)));
    }

    Ok(sign * total)
}

/// Format a duration exactly, by greedy unit decomposition.
///
/// The result always reparses to the same second count, which makes it
/// safe to write into a token's raw form.
pub fn format_duration_exact(secs: i64) -> String {
    if secs == 0 {
        return "0S".to_string();
    }
    let mut out = String::new();
    if secs < 0 {
        out.push('-');
    }
    let mut rem = secs.abs();
    for (unit, glyph) in [
        (YEAR, 'y'),
        (MONTH, 'm'),
        (WEEK, 'w'),
        (DAY, 'd'),
        (HOUR, 'h'),
        (MINUTE, 'M'),
        (1, 'S'),
    ] {
        let n = rem / unit;
        if n > 0 {
            out.push_str(&n.to_string());
            out.push(glyph);
            rem %= unit;
        }
    }
    out
}

/// Format a duration in the compact human form used for display.
///
/// `'` marks hours and `"` marks minutes; an exact zero renders as
/// `rn` ("right now").
pub fn format_duration_human(secs: i64) -> String {
    if secs == 0 {
        return "rn".to_string();
    }
    if secs < 0 {
        return format!("-{}", format_duration_human(-secs));
    }

    let years = secs as f64 / YEAR as f64;
    if years >= 1.25 {
        return trim_decimal(years, 'y');
    }
    if years >= 1.0 {
        let months = (secs - YEAR) / MONTH;
        if months >= 1 {
            return format!("1y{}m", months);
        }
        return "1y".to_string();
    }

    let months = secs as f64 / MONTH as f64;
    if months >= 2.0 {
        return trim_decimal(months, 'm');
    }
    if months >= 1.0 {
        let rem = secs - MONTH;
        if rem >= WEEK {
            return format!("1m{}w", rem / WEEK);
        }
        if rem >= DAY {
            return format!("1m{}d", rem / DAY);
        }
        return "1m".to_string();
    }

    if secs >= WEEK {
        let weeks = secs / WEEK;
        let days = (secs % WEEK) / DAY;
        if days > 0 {
            return format!("{}w{}d", weeks, days);
        }
        return format!("{}w", weeks);
    }

    let days = secs / DAY;
    if days >= 2 {
        return format!("{}d", days);
    }
    if days == 1 {
        let hours = (secs - DAY) / HOUR;
        if hours > 0 {
            return format!("1d{}'", hours);
        }
        return "1d".to_string();
    }

    let hours = secs / HOUR;
    if hours >= 2 {
        let minutes = (secs % HOUR) / MINUTE;
        if minutes > 0 {
            return format!("{}'{}\"", hours, minutes);
        }
        return format!("{}'", hours);
    }

    // Under two hours: emit only the components that are present.
    let minutes = (secs % HOUR) / MINUTE;
    let seconds = secs % MINUTE;
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}'", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}\"", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    out
}

/// One-decimal formatting with a trailing `.0` stripped.
fn trim_decimal(value: f64, glyph: char) -> String {
    let rounded = (value * 10.0).floor() / 10.0;
    if (rounded - rounded.floor()).abs() < f64::EPSILON {
        format!("{}{}", rounded as i64, glyph)
    } else {
        format!("{:.1}{}", rounded, glyph)
    }
}

/// A `variable=<field>;<dur>` reference: a duration anchored at another
/// temporal field of the same task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDuration {
    /// One of `c`, `lud`, `due`, `end`, `dead`.
    pub field: String,
    /// Offset in seconds from the referenced field.
    pub offset: i64,
}

/// Parse the `variable=<field>;<dur>` form.
pub fn parse_variable(s: &str) -> Result<VariableDuration> {
    let body = s
        .strip_prefix("variable=")
        .ok_or_else(|| Error::Parse(format!("not a variable duration: {}", s)))?;
    let (field, dur) = body
        .split_once(';')
        .ok_or_else(|| Error::Parse(format!("variable duration missing ';': {}", s)))?;
    match field {
        "c" | "lud" | "due" | "end" | "dead" => {}
        _ => return Err(Error::Parse(format!("unknown variable field: {}", field))),
    }
    Ok(VariableDuration {
        field: field.to_string(),
        offset: parse_duration(dur)?,
    })
}
