//! Text-edit primitives and field updates on a task.
//!
//! Every mutator that changes a typed value rewrites the owning
//! token's raw in place, so re-serializing the task always yields a
//! line that reparses to an equivalent state. Mutations that rebuild
//! the text go back through the parser to recompute the temporal
//! dependency rules.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::task::model::Task;
use crate::task::parse::parse_task;
use crate::task::token::{Token, TokenKind, TokenValue};
use crate::time;

impl Task {
    /// Reparse `text` in place, preserving the dense list id.
    fn reparse_into(&mut self, text: &str) -> Result<Vec<String>> {
        let id = self.id;
        let (mut task, diagnostics) = parse_task(text)?;
        task.id = id;
        *self = task;
        Ok(diagnostics)
    }

    /// Append text to the task and recompute temporal dependencies.
    pub fn append_text(&mut self, s: &str) -> Result<Vec<String>> {
        if s.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        let text = format!("{} {}", self.to_line(), s);
        self.reparse_into(&text)
    }

    /// Prepend text to the task and recompute temporal dependencies.
    pub fn prepend_text(&mut self, s: &str) -> Result<Vec<String>> {
        if s.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        let text = format!("{} {}", s, self.to_line());
        self.reparse_into(&text)
    }

    /// Replace the task's text entirely.
    ///
    /// The dense id and the original creation time survive; a `$c=` in
    /// the replacement is dropped.
    pub fn replace_text(&mut self, s: &str) -> Result<Vec<String>> {
        if s.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        let creation = self.time.creation;
        let kept: Vec<&str> = s
            .split(' ')
            .filter(|frag| !frag.starts_with("$c="))
            .collect();
        let mut text = kept.join(" ");
        if let Some(c) = creation {
            text.push_str(&format!(" $c={}", time::format_absolute(c)));
        }
        self.reparse_into(&text)
    }

    /// Upsert a leading `(p)` priority token.
    ///
    /// `p` may come with or without the parens; whitespace anywhere in
    /// it is rejected.
    pub fn set_priority(&mut self, p: &str) -> Result<()> {
        let inner = p
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(p);
        if inner.is_empty() || inner.chars().any(char::is_whitespace) {
            return Err(Error::Value(format!("bad priority: {:?}", p)));
        }

        let token = Token {
            kind: TokenKind::Priority,
            key: None,
            raw: format!("({})", inner),
            value: TokenValue::Str(inner.to_string()),
        };
        match self.find_token(|t| t.kind == TokenKind::Priority) {
            Some(i) => self.tokens[i] = token,
            None => self.tokens.insert(0, token),
        }
        self.priority = Some(inner.to_string());
        Ok(())
    }

    /// Remove the priority token. No-op when absent.
    pub fn clear_priority(&mut self) {
        self.tokens.retain(|t| t.kind != TokenKind::Priority);
        self.priority = None;
    }

    /// Rewrite a date field's token to an absolute form.
    ///
    /// The whole task is reparsed afterwards so the dependency rules
    /// re-run against the new value.
    pub fn set_date(&mut self, field: &str, t: NaiveDateTime) -> Result<Vec<String>> {
        match field {
            "c" | "lud" | "due" | "end" | "dead" => {}
            _ => return Err(Error::Value(format!("not a settable date field: {}", field))),
        }
        let i = self
            .find_token(|tok| tok.is_date(field))
            .ok_or_else(|| Error::NotFound(format!("no ${}= token", field)))?;
        self.tokens[i].raw = format!("${}={}", field, time::format_absolute(t));
        self.tokens[i].value = TokenValue::DateTime(t);
        let text = self.to_line();
        self.reparse_into(&text)
    }

    /// Adjust the progress count by `delta`, clamped to
    /// `[0, doneCount]`.
    pub fn adjust_progress(&mut self, delta: i64) -> Result<()> {
        let progress = self
            .progress
            .as_mut()
            .ok_or_else(|| Error::Value("task has no progress".to_string()))?;
        progress.count = (progress.count + delta).clamp(0, progress.done_count);

        let value = progress.to_value();
        let snapshot = progress.clone();
        let i = self
            .find_token(|t| t.kind == TokenKind::Progress)
            .ok_or_else(|| Error::NotFound("no $p= token".to_string()))?;
        self.tokens[i].raw = format!("$p={}", value);
        self.tokens[i].value = TokenValue::Progress(snapshot);
        Ok(())
    }

    /// Flip `$id=` to `$-id=` and back.
    pub fn toggle_collapsed(&mut self) -> Result<()> {
        if let Some(i) = self.find_token(|t| t.kind == TokenKind::Id && t.key.as_deref() == Some("id")) {
            let value = self.tokens[i].dollar_value().unwrap_or_default().to_string();
            self.tokens[i].kind = TokenKind::Format;
            self.tokens[i].key = Some("-id".to_string());
            self.tokens[i].raw = format!("$-id={}", value);
            return Ok(());
        }
        if let Some(i) = self.find_token(|t| t.kind == TokenKind::Format) {
            let value = self.tokens[i].dollar_value().unwrap_or_default().to_string();
            self.tokens[i].kind = TokenKind::Id;
            self.tokens[i].key = Some("id".to_string());
            self.tokens[i].raw = format!("$id={}", value);
            return Ok(());
        }
        Err(Error::NotFound("no id token".to_string()))
    }
}
