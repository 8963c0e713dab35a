//! Recurrence: advance overdue `$due=` dates by whole `$every=` steps.
//!
//! For every task where both are set and the due date has passed, the
//! due moves forward by the smallest whole number of intervals that
//! lands it strictly in the future. A past `$end=` (or, failing that,
//! a past `$dead=`) shifts by the same distance so the pair keeps its
//! spacing. Reminders are never auto-shifted.

use chrono::{Duration, NaiveDateTime};

use crate::list::List;
use crate::task::token::TokenValue;
use crate::task::Task;
use crate::time;

/// Advance all overdue recurring tasks in a list. Returns how many
/// tasks changed.
pub fn advance_list(list: &mut List, now: NaiveDateTime) -> usize {
    let mut changed = 0;
    for task in &mut list.tasks {
        if advance_task(task, now) {
            changed += 1;
        }
    }
    changed
}

/// Advance one task if it is overdue and recurring.
pub fn advance_task(task: &mut Task, now: NaiveDateTime) -> bool {
    let (due, every) = match (task.time.due, task.time.every) {
        (Some(due), Some(every)) if due < now => (due, every),
        _ => return false,
    };

    // Smallest k >= 1 with due + k * every > now.
    let delta = (now - due).num_seconds();
    let k = delta / every + 1;
    let diff = k * every;
    let new_due = due + Duration::seconds(diff);

    task.time.due = Some(new_due);
    rewrite_date(task, "due", new_due, task.time.creation);

    // Keep the companion window aligned when it has also passed.
    if let Some(end) = task.time.end {
        if end < now {
            let new_end = end + Duration::seconds(diff);
            task.time.end = Some(new_end);
        }
        rewrite_date(task, "end", task.time.end.unwrap_or(end), Some(new_due));
    } else if let Some(dead) = task.time.dead {
        if dead < now {
            let new_dead = dead + Duration::seconds(diff);
            task.time.dead = Some(new_dead);
        }
        rewrite_date(task, "dead", task.time.dead.unwrap_or(dead), Some(new_due));
    }

    true
}

/// Rewrite a date token's raw: relative to the anchor when that stays
/// a positive offset, absolute otherwise.
fn rewrite_date(task: &mut Task, key: &str, value: NaiveDateTime, anchor: Option<NaiveDateTime>) {
    let i = match task.find_token(|t| t.is_date(key)) {
        Some(i) => i,
        None => return,
    };
    let raw_value = match anchor {
        Some(base) if value > base => time::format_duration_exact((value - base).num_seconds()),
        _ => time::format_absolute(value),
    };
    task.tokens[i].raw = format!("${}={}", key, raw_value);
    task.tokens[i].value = TokenValue::DateTime(value);
}
