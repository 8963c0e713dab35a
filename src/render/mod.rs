//! Renderer: colored, width-folded list output.
//!
//! Token order is never changed here; the renderer only styles and
//! folds. Column widths are computed per list so ids and progress
//! counters align, and the temporal state of a task decides the date
//! colors (a running event tints the whole task's text, an overdue
//! task without a future end or deadline burns it).

mod fold;
mod palette;

pub use fold::fold;

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::color::Painter;
use crate::config::Config;
use crate::list::List;
use crate::sort::{sorted_entries, Entry};
use crate::task::token::{Token, TokenKind, TokenValue};
use crate::task::Task;
use crate::time;

/// Narrowest width the renderer will fold to.
pub const MIN_WIDTH: usize = 40;
/// Widest width the renderer will fold to.
pub const MAX_WIDTH: usize = 160;

/// Column widths for one list.
#[derive(Debug, Clone, Copy, Default)]
struct Widths {
    id: usize,
    count: usize,
    done: usize,
}

fn digits(n: usize) -> usize {
    n.to_string().len()
}

fn digits_i64(n: i64) -> usize {
    n.to_string().len()
}

/// Overall temporal state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemporalState {
    Normal,
    /// due passed, end still ahead.
    Running,
    /// due passed, deadline still ahead.
    Deadline,
    /// due passed, nothing ahead.
    Burnt,
}

fn temporal_state(task: &Task, now: NaiveDateTime) -> TemporalState {
    match task.time.due {
        Some(due) if due < now => {
            if task.time.end.map_or(false, |e| e > now) {
                TemporalState::Running
            } else if task.time.dead.map_or(false, |d| d > now) {
                TemporalState::Deadline
            } else {
                TemporalState::Burnt
            }
        }
        _ => TemporalState::Normal,
    }
}

/// List renderer bound to a config, a width and a clock.
pub struct Renderer<'a> {
    config: &'a Config,
    painter: Painter,
    width: usize,
    now: NaiveDateTime,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config, width: usize, now: NaiveDateTime) -> Self {
        Self {
            config,
            painter: Painter::new(config.color_mode),
            width: width.clamp(MIN_WIDTH, MAX_WIDTH),
            now,
        }
    }

    /// Render a whole list: header, category headers, folded task
    /// lines.
    pub fn render_list(&self, list: &List) -> Vec<String> {
        let entries = sorted_entries(list);
        let widths = self.widths(list);
        let priorities = palette::priority_colors(
            list.tasks.iter().filter_map(|t| t.priority.as_deref()),
            &self.config.print.priority,
        );
        let ids = palette::id_colors(
            list.tasks.iter().filter_map(|t| t.eid.as_deref()),
            &self.config.print.ids,
        );

        let mut out = Vec::new();
        out.push(self.header_line(&list.name));

        let mut last_category = String::new();
        let mut collapse_below: Option<usize> = None;
        for entry in &entries {
            if let Some(depth) = collapse_below {
                if entry.depth > depth {
                    continue;
                }
                collapse_below = None;
            }
            let task = &list.tasks[entry.index];
            if task.collapsed() {
                collapse_below = Some(entry.depth);
            }

            let category = task.category();
            if !category.is_empty() && category != last_category {
                out.push(
                    self.painter
                        .paint(&format!("{}:", category), self.config.print.color("header")),
                );
            }
            last_category = category.to_string();

            let line = self.task_line(task, *entry, widths, &priorities, &ids);
            out.extend(fold(&line, self.width));
        }
        out
    }

    /// Render a single task, without the list header.
    pub fn render_task(&self, list: &List, id: usize) -> crate::error::Result<Vec<String>> {
        let i = list.index_of(id)?;
        let widths = self.widths(list);
        let priorities = palette::priority_colors(
            list.tasks.iter().filter_map(|t| t.priority.as_deref()),
            &self.config.print.priority,
        );
        let ids = palette::id_colors(
            list.tasks.iter().filter_map(|t| t.eid.as_deref()),
            &self.config.print.ids,
        );
        let entry = Entry { index: i, depth: 0 };
        let line = self.task_line(&list.tasks[i], entry, widths, &priorities, &ids);
        Ok(fold(&line, self.width))
    }

    fn widths(&self, list: &List) -> Widths {
        let mut widths = Widths {
            id: digits(list.max_id().unwrap_or(0)),
            ..Widths::default()
        };
        for task in &list.tasks {
            if let Some(p) = &task.progress {
                widths.count = widths.count.max(digits_i64(p.count));
                widths.done = widths.done.max(digits_i64(p.done_count));
            }
        }
        widths
    }

    /// `> name` followed by an em-dash rule out to the width bound.
    fn header_line(&self, name: &str) -> String {
        let prefix = format!("> {} ", name);
        let rule_len = self.width.saturating_sub(prefix.chars().count()).max(3);
        let rule: String = "\u{2014}".repeat(rule_len);
        self.painter
            .paint(&format!("{}{}", prefix, rule), self.config.print.color("header"))
    }

    fn task_line(
        &self,
        task: &Task,
        entry: Entry,
        widths: Widths,
        priorities: &HashMap<String, String>,
        ids: &HashMap<String, String>,
    ) -> String {
        let state = temporal_state(task, self.now);
        let mut chunks = Vec::with_capacity(task.tokens.len() + 1);

        let indent = "  ".repeat(entry.depth);
        let id_text = match task.id {
            Some(id) => format!("{:>width$}", id, width = widths.id),
            None => " ".repeat(widths.id),
        };
        chunks.push(format!(
            "{}{}",
            indent,
            self.painter.paint(&id_text, self.config.print.color("index"))
        ));

        let mut quote: Option<char> = None;
        for token in &task.tokens {
            chunks.push(self.token_chunk(task, token, state, widths, priorities, ids, &mut quote));
        }

        chunks.join(" ")
    }

    #[allow(clippy::too_many_arguments)]
    fn token_chunk(
        &self,
        task: &Task,
        token: &Token,
        state: TemporalState,
        widths: Widths,
        priorities: &HashMap<String, String>,
        ids: &HashMap<String, String>,
        quote: &mut Option<char>,
    ) -> String {
        let print = &self.config.print;
        match token.kind {
            TokenKind::Text => {
                let hex = match state {
                    TemporalState::Burnt => print.color("burnt").to_string(),
                    TemporalState::Running => print.color("running-event-text").to_string(),
                    _ => self.text_color(&token.raw, quote),
                };
                self.painter.paint(&token.raw, &hex)
            }
            TokenKind::Hint => {
                let sigil = token.key.as_deref().unwrap_or("+");
                self.painter.paint(&token.raw, print.hint_color(sigil))
            }
            TokenKind::Priority => {
                let hex = task
                    .priority
                    .as_ref()
                    .and_then(|p| priorities.get(p))
                    .map(String::as_str)
                    .unwrap_or_else(|| print.color("default"));
                self.painter.paint(&token.raw, hex)
            }
            TokenKind::Id | TokenKind::Format => {
                let key = match token.key.as_deref() {
                    Some("P") => task.pid.as_deref(),
                    _ => task.eid.as_deref(),
                };
                let hex = key
                    .and_then(|k| ids.get(k))
                    .map(String::as_str)
                    .unwrap_or_else(|| print.color("default"));
                self.painter.paint(&token.raw, hex)
            }
            TokenKind::Date => self.date_chunk(task, token, state),
            TokenKind::Duration => {
                let display = match token.value {
                    TokenValue::Dur(secs) => {
                        format!("$every={}", time::format_duration_human(secs))
                    }
                    _ => token.raw.clone(),
                };
                self.painter.paint(&display, print.color("every"))
            }
            TokenKind::Progress => self.progress_chunk(task, widths),
        }
    }

    /// Quote tracking across text tokens: a token that opens a `'` or
    /// `"` run keeps the quote color until the closing token.
    fn text_color(&self, raw: &str, quote: &mut Option<char>) -> String {
        let print = &self.config.print;
        if let Some(q) = *quote {
            if raw.ends_with(q) {
                *quote = None;
            }
            let kind = if q == '\'' { "single" } else { "double" };
            return print.quote_color(kind).to_string();
        }
        for (q, kind) in [('\'', "single"), ('"', "double")] {
            if raw.starts_with(q) && raw.len() > 1 {
                if !raw[1..].ends_with(q) {
                    *quote = Some(q);
                }
                return print.quote_color(kind).to_string();
            }
        }
        print.color("default").to_string()
    }

    /// Date tokens render as the compact duration from their companion
    /// field; the color depends on the task's temporal state.
    fn date_chunk(&self, task: &Task, token: &Token, state: TemporalState) -> String {
        let print = &self.config.print;
        let key = token.key.as_deref().unwrap_or_default();
        let value = match token.value {
            TokenValue::DateTime(t) => t,
            // A reverted or unresolved date keeps its raw form.
            _ => return self.painter.paint(&token.raw, print.color("default")),
        };

        let companion = match key {
            "c" | "lud" => Some(self.now),
            "due" => task.time.creation,
            "end" | "dead" | "r" => task.time.due,
            _ => None,
        };
        let display = match companion {
            Some(base) => {
                let delta = (value - base).num_seconds();
                format!("${}={}", key, time::format_duration_human(delta))
            }
            None => format!("${}={}", key, time::format_absolute(value)),
        };

        let hex = match key {
            "c" | "lud" => print.color("header"),
            "r" => print.color("reminder"),
            "due" => match state {
                TemporalState::Normal => print.color("date-due"),
                _ => print.color("burnt"),
            },
            "end" => match state {
                TemporalState::Running => print.color("running-event"),
                TemporalState::Burnt => print.color("burnt"),
                _ => print.color("date-due"),
            },
            "dead" => match state {
                TemporalState::Deadline => print.color("imminent-deadline"),
                TemporalState::Burnt => print.color("burnt"),
                _ => print.color("date-due"),
            },
            _ => print.color("default"),
        };
        self.painter.paint(&display, hex)
    }

    /// Expand progress into `count/done(p%)`, a bar, and `(unit)`.
    fn progress_chunk(&self, task: &Task, widths: Widths) -> String {
        let print = &self.config.print;
        let progress = match &task.progress {
            Some(p) => p,
            None => return String::new(),
        };
        let pct = progress.percent();

        let count = format!("{:>w$}", progress.count, w = widths.count.max(1));
        let done = format!("{:<w$}", progress.done_count, w = widths.done.max(1));

        let pct_hex = self.percent_color(pct);
        let len = print.progress.bartext_len;
        let filled = ((pct as usize) * len + 50) / 100;
        let bar_done: String = "=".repeat(filled.min(len));
        let bar_todo: String = "-".repeat(len - filled.min(len));

        let mut chunk = String::new();
        chunk.push_str(&self.painter.paint(&count, print.progress_color("count")));
        chunk.push_str(&self.painter.paint("/", print.color("default")));
        chunk.push_str(&self.painter.paint(&done, print.progress_color("done-count")));
        chunk.push_str(&self.painter.paint(&format!("({}%)", pct), &pct_hex));
        chunk.push(' ');
        chunk.push_str(&self.painter.paint("[", print.color("default")));
        chunk.push_str(&self.painter.paint(&bar_done, print.progress_color("bar-done")));
        chunk.push_str(&self.painter.paint(&bar_todo, print.progress_color("bar-todo")));
        chunk.push_str(&self.painter.paint("]", print.color("default")));
        chunk.push(' ');
        chunk.push_str(&self.painter.paint(
            &format!("({})", progress.unit),
            print.progress_color("unit"),
        ));
        chunk
    }

    /// Percentage color: hue sweeps red to green, saturation and
    /// lightness interpolate between the configured endpoints.
    fn percent_color(&self, pct: i64) -> String {
        let p = &self.config.print.progress;
        let f = (pct as f64 / 100.0).clamp(0.0, 1.0);
        let hue = 120.0 * f;
        let sat = p.start_saturation + (p.end_saturation - p.start_saturation) * f;
        let lit = p.start_lightness + (p.end_lightness - p.start_lightness) * f;
        crate::color::hsl_to_hex(hue, sat, lit)
    }
}
