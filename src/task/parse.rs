//! Task parser: token stream to typed task.
//!
//! The walk assigns each typed token to its field only when the field
//! is still empty; later occurrences of a non-reminder key revert to
//! text. A resolution pass then enforces the inter-field rules: dates
//! anchor on their companion field, `end`/`dead` require `due`, and
//! every violation demotes the offending token back to plain text
//! instead of failing the line. Parsing a task therefore never fails a
//! file; callers get the task plus a list of diagnostics.

use chrono::{Duration, NaiveDateTime};

use crate::error::{Error, Result};
use crate::task::model::{Progress, Task, Temporal};
use crate::task::token::{tokenize, Token, TokenKind, TokenValue};
use crate::time;

/// Recurrence bounds: `$every=` must land in `[1d, 10y)`.
const EVERY_MIN: i64 = time::DAY;
const EVERY_MAX: i64 = 10 * time::YEAR;

/// Parse a task line against the current wall clock.
pub fn parse_task(line: &str) -> Result<(Task, Vec<String>)> {
    parse_task_at(line, time::now())
}

/// Parse a task line against an explicit `now` (tests use a fixed one).
pub fn parse_task_at(line: &str, now: NaiveDateTime) -> Result<(Task, Vec<String>)> {
    if line.trim().is_empty() {
        return Err(Error::EmptyText);
    }

    let (tokens, mut diagnostics) = tokenize(line);
    let mut task = Task::from_tokens(tokens);

    let slots = walk(&mut task, &mut diagnostics);
    resolve(&mut task, &slots, now, &mut diagnostics);

    Ok((task, diagnostics))
}

/// First-occurrence token indices per typed field.
#[derive(Debug, Default)]
struct Slots {
    priority: Option<usize>,
    eid: Option<usize>,
    pid: Option<usize>,
    creation: Option<usize>,
    last_updated: Option<usize>,
    due: Option<usize>,
    end: Option<usize>,
    dead: Option<usize>,
    reminders: Vec<usize>,
    every: Option<usize>,
    progress: Option<usize>,
}

/// Left-to-right walk: claim slots, revert duplicates.
fn walk(task: &mut Task, diagnostics: &mut Vec<String>) -> Slots {
    let mut slots = Slots::default();

    for i in 0..task.tokens.len() {
        let (kind, key) = {
            let t = &task.tokens[i];
            (t.kind, t.key.clone())
        };
        let slot = match kind {
            TokenKind::Priority => &mut slots.priority,
            TokenKind::Id if key.as_deref() == Some("P") => &mut slots.pid,
            TokenKind::Id | TokenKind::Format => &mut slots.eid,
            TokenKind::Date => match key.as_deref() {
                Some("c") => &mut slots.creation,
                Some("lud") => &mut slots.last_updated,
                Some("due") => &mut slots.due,
                Some("end") => &mut slots.end,
                Some("dead") => &mut slots.dead,
                Some("r") => {
                    slots.reminders.push(i);
                    continue;
                }
                _ => continue,
            },
            TokenKind::Duration => &mut slots.every,
            TokenKind::Progress => &mut slots.progress,
            TokenKind::Text | TokenKind::Hint => continue,
        };

        if slot.is_some() {
            diagnostics.push(format!("{}: duplicate key, reverted to text", task.tokens[i].raw));
            task.tokens[i].revert();
        } else {
            *slot = Some(i);
        }
    }

    slots
}

/// Dependency-resolution pass over the claimed slots.
fn resolve(task: &mut Task, slots: &Slots, now: NaiveDateTime, diagnostics: &mut Vec<String>) {
    resolve_creation(task, slots, now, diagnostics);
    resolve_last_updated(task, slots, diagnostics);
    resolve_due(task, slots, diagnostics);
    resolve_end_dead(task, slots, diagnostics);
    resolve_reminders(task, slots, diagnostics);
    resolve_every(task, slots, diagnostics);
    resolve_progress(task, slots, diagnostics);
    resolve_ids(task, slots, diagnostics);
    resolve_priority(task, slots);
}

/// Resolve a date value: absolute, `variable=` reference, or a bare
/// duration added to `anchor`.
fn resolve_date_value(
    value: &str,
    anchor: Option<NaiveDateTime>,
    state: &Temporal,
) -> Result<NaiveDateTime> {
    if let Ok(abs) = time::parse_absolute(value) {
        return Ok(abs);
    }
    if value.starts_with("variable=") {
        let var = time::parse_variable(value)?;
        let base = match var.field.as_str() {
            "c" => state.creation,
            "lud" => state.last_updated,
            "due" => state.due,
            "end" => state.end,
            "dead" => state.dead,
            _ => None,
        };
        let base = base.or(state.creation).ok_or_else(|| {
            Error::Parse(format!("variable field {} unset and no creation", var.field))
        })?;
        return Ok(base + Duration::seconds(var.offset));
    }
    let dur = time::parse_duration(value)?;
    let anchor = anchor.ok_or_else(|| Error::Parse(format!("no anchor for relative date {}", value)))?;
    Ok(anchor + Duration::seconds(dur))
}

fn revert_at(task: &mut Task, i: usize, reason: &str, diagnostics: &mut Vec<String>) {
    diagnostics.push(format!("{}: {}, reverted to text", task.tokens[i].raw, reason));
    task.tokens[i].revert();
}

fn resolve_creation(task: &mut Task, slots: &Slots, now: NaiveDateTime, diagnostics: &mut Vec<String>) {
    if let Some(i) = slots.creation {
        let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
        match resolve_date_value(&value, Some(now), &task.time) {
            Ok(t) => {
                task.time.creation = Some(t);
                task.tokens[i].value = TokenValue::DateTime(t);
                return;
            }
            Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
        }
    }
    // Missing creation is assigned now; the token is materialized so a
    // stored line reparses to the same state.
    task.time.creation = Some(now);
    task.tokens.push(Token {
        kind: TokenKind::Date,
        key: Some("c".to_string()),
        raw: format!("$c={}", time::format_absolute(now)),
        value: TokenValue::DateTime(now),
    });
}

fn resolve_last_updated(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    let creation = task.time.creation.expect("creation resolved first");
    let floor = creation + Duration::seconds(1);

    if let Some(i) = slots.last_updated {
        let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
        match resolve_date_value(&value, Some(creation), &task.time) {
            Ok(t) if t > creation => {
                task.time.last_updated = Some(t);
                task.tokens[i].value = TokenValue::DateTime(t);
                return;
            }
            Ok(_) => {
                // Not strictly after creation: pulled up, not reverted.
                task.time.last_updated = Some(floor);
                task.tokens[i].raw = format!("$lud={}", time::format_absolute(floor));
                task.tokens[i].value = TokenValue::DateTime(floor);
                return;
            }
            Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
        }
    }
    task.time.last_updated = Some(floor);
    task.tokens.push(Token {
        kind: TokenKind::Date,
        key: Some("lud".to_string()),
        raw: format!("$lud={}", time::format_absolute(floor)),
        value: TokenValue::DateTime(floor),
    });
}

fn resolve_due(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    let i = match slots.due {
        Some(i) => i,
        None => return,
    };
    let creation = task.time.creation;
    let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
    match resolve_date_value(&value, creation, &task.time) {
        Ok(t) if Some(t) > creation => {
            task.time.due = Some(t);
            task.tokens[i].value = TokenValue::DateTime(t);
        }
        Ok(_) => revert_at(task, i, "due not after creation", diagnostics),
        Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
    }
}

fn resolve_end_dead(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    // end and dead are mutually exclusive semantics: both present
    // reverts both.
    if let (Some(e), Some(d)) = (slots.end, slots.dead) {
        revert_at(task, e, "end and dead are mutually exclusive", diagnostics);
        revert_at(task, d, "end and dead are mutually exclusive", diagnostics);
        return;
    }

    for (slot, field_is_end) in [(slots.end, true), (slots.dead, false)] {
        let i = match slot {
            Some(i) => i,
            None => continue,
        };
        let due = match task.time.due {
            Some(due) => due,
            None => {
                revert_at(task, i, "requires due", diagnostics);
                continue;
            }
        };
        let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
        match resolve_date_value(&value, Some(due), &task.time) {
            Ok(t) if t > due => {
                if field_is_end {
                    task.time.end = Some(t);
                } else {
                    task.time.dead = Some(t);
                }
                task.tokens[i].value = TokenValue::DateTime(t);
            }
            Ok(_) => revert_at(task, i, "not after due", diagnostics),
            Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
        }
    }
}

fn resolve_reminders(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    let creation = task.time.creation.expect("creation resolved first");
    // A bare-duration reminder anchors on due when present, otherwise
    // on creation.
    let anchor = task.time.due.or(task.time.creation);

    for &i in &slots.reminders {
        let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
        match resolve_date_value(&value, anchor, &task.time) {
            Ok(t) if Some(t) == task.time.due => {
                revert_at(task, i, "reminder equals due", diagnostics)
            }
            Ok(t) if t <= creation => {
                revert_at(task, i, "reminder not after creation", diagnostics)
            }
            Ok(t) => {
                task.time.reminders.push(t);
                task.tokens[i].value = TokenValue::DateTime(t);
            }
            Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
        }
    }
}

fn resolve_every(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    let i = match slots.every {
        Some(i) => i,
        None => return,
    };
    let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
    match time::parse_duration(&value) {
        Ok(d) if (EVERY_MIN..EVERY_MAX).contains(&d) => {
            task.time.every = Some(d);
            task.tokens[i].value = TokenValue::Dur(d);
        }
        Ok(_) => revert_at(task, i, "every out of range [1d, 10y)", diagnostics),
        Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
    }
}

fn resolve_progress(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    let i = match slots.progress {
        Some(i) => i,
        None => return,
    };
    let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
    match parse_progress(&value) {
        Ok(p) => {
            task.tokens[i].value = TokenValue::Progress(p.clone());
            task.progress = Some(p);
        }
        Err(e) => revert_at(task, i, &e.to_string(), diagnostics),
    }
}

/// Parse `unit[/category]/count/doneCount`, clamping into the progress
/// invariant.
pub(crate) fn parse_progress(value: &str) -> Result<Progress> {
    let parts: Vec<&str> = value.split('/').collect();
    let (unit, category, count_s, done_s) = match parts.as_slice() {
        [unit, count, done] => (*unit, "", *count, *done),
        [unit, category, count, done] => (*unit, *category, *count, *done),
        _ => {
            return Err(Error::Parse(format!(
                "progress needs 3 or 4 parts, got {}",
                parts.len()
            )))
        }
    };
    if unit.is_empty() {
        return Err(Error::Value("progress unit is empty".to_string()));
    }
    let count: i64 = count_s
        .parse()
        .map_err(|_| Error::Parse(format!("bad progress count: {}", count_s)))?;
    let done_count: i64 = done_s
        .parse()
        .map_err(|_| Error::Parse(format!("bad progress doneCount: {}", done_s)))?;

    let done_count = done_count.max(1);
    Ok(Progress {
        unit: unit.to_string(),
        category: category.to_string(),
        count: count.clamp(0, done_count),
        done_count,
    })
}

fn resolve_ids(task: &mut Task, slots: &Slots, diagnostics: &mut Vec<String>) {
    if let Some(i) = slots.eid {
        let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
        match value.parse::<i64>() {
            Ok(n) if n >= 0 => {
                task.tokens[i].value = TokenValue::Int(n);
                task.eid = Some(value);
            }
            _ => revert_at(task, i, "id must be a non-negative integer", diagnostics),
        }
    }
    if let Some(i) = slots.pid {
        let value = task.tokens[i].dollar_value().unwrap_or_default().to_string();
        match value.parse::<i64>() {
            Ok(n) if n >= 0 => {
                task.tokens[i].value = TokenValue::Int(n);
                task.pid = Some(value);
            }
            _ => revert_at(task, i, "parent id must be a non-negative integer", diagnostics),
        }
    }
}

fn resolve_priority(task: &mut Task, slots: &Slots) {
    if let Some(i) = slots.priority {
        if let TokenValue::Str(p) = &task.tokens[i].value {
            task.priority = Some(p.clone());
        }
    }
}
