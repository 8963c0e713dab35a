//! In-memory task representation.
//!
//! A task is an ordered sequence of tokens plus denormalized accessors
//! for the typed fields. The token vector's order always equals the
//! order on disk; serializing a task is joining raws with single spaces.

use chrono::NaiveDateTime;

use crate::task::token::{Token, TokenKind, TokenValue};

/// Bounded progress counter attached to a task via `$p=`.
///
/// Invariant: `1 <= done_count` and `0 <= count <= done_count`.
/// Arithmetic on `count` clamps into that range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Unit label, e.g. "page". Never empty.
    pub unit: String,
    /// Grouping category; may be empty.
    pub category: String,
    /// Completed units.
    pub count: i64,
    /// Total units.
    pub done_count: i64,
}

impl Progress {
    /// Percentage completed, clamped to `[0, 100]`.
    pub fn percent(&self) -> i64 {
        if self.done_count <= 0 {
            return 0;
        }
        (self.count * 100 / self.done_count).clamp(0, 100)
    }

    /// Serialized `$p=` value: `unit[/category]/count/doneCount`.
    pub fn to_value(&self) -> String {
        if self.category.is_empty() {
            format!("{}/{}/{}", self.unit, self.count, self.done_count)
        } else {
            format!(
                "{}/{}/{}/{}",
                self.unit, self.category, self.count, self.done_count
            )
        }
    }
}

/// Temporal fields of a task, all resolved to absolute datetimes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Temporal {
    pub creation: Option<NaiveDateTime>,
    pub last_updated: Option<NaiveDateTime>,
    pub due: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub dead: Option<NaiveDateTime>,
    /// Ordered multiset; the only typed key allowed to repeat.
    pub reminders: Vec<NaiveDateTime>,
    /// Recurrence interval in seconds.
    pub every: Option<i64>,
}

/// A single todo line parsed into tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Tokens in disk order.
    pub tokens: Vec<Token>,
    /// Dense list-position id; unset transiently until list cleanup.
    pub id: Option<usize>,
    /// Explicit id (`$id=` or the collapsed `$-id=`), unique per list.
    pub eid: Option<String>,
    /// Explicit parent reference (`$P=`), matched against sibling eids.
    pub pid: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<Progress>,
    pub time: Temporal,
    /// Arena index of the resolved parent, set during list cleanup.
    pub parent: Option<usize>,
    /// Arena indices of resolved children, in document order.
    pub children: Vec<usize>,
    /// Display depth assigned by the sorter (0 = top level).
    pub depth: usize,
}

impl Task {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            id: None,
            eid: None,
            pid: None,
            priority: None,
            progress: None,
            time: Temporal::default(),
            parent: None,
            children: Vec::new(),
            depth: 0,
        }
    }

    /// Serialize back to a list-file line.
    pub fn to_line(&self) -> String {
        let raws: Vec<&str> = self.tokens.iter().map(|t| t.raw.as_str()).collect();
        raws.join(" ")
    }

    /// Normalized text used for duplicate detection: raws joined by
    /// single spaces with `$c=`, `$lud=` and `$id=` tokens excluded.
    pub fn normalized_text(&self) -> String {
        let raws: Vec<&str> = self
            .tokens
            .iter()
            .filter(|t| {
                !(t.is_date("c")
                    || t.is_date("lud")
                    || (t.kind == TokenKind::Id && t.key.as_deref() == Some("id"))
                    || t.kind == TokenKind::Format)
            })
            .map(|t| t.raw.as_str())
            .collect();
        raws.join(" ")
    }

    /// All plus-hint words, in token order.
    pub fn plus_hints(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Hint && t.key.as_deref() == Some("+"))
            .filter_map(|t| match &t.value {
                TokenValue::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Regular text tokens joined by single spaces.
    pub fn regular_text(&self) -> String {
        let words: Vec<&str> = self
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Text)
            .map(|t| t.raw.as_str())
            .collect();
        words.join(" ")
    }

    /// Progress category, or empty when the task has no progress.
    pub fn category(&self) -> &str {
        self.progress.as_ref().map(|p| p.category.as_str()).unwrap_or("")
    }

    /// True when the id token is stored in the collapsed `$-id=` form.
    pub fn collapsed(&self) -> bool {
        self.tokens.iter().any(|t| t.kind == TokenKind::Format)
    }

    /// Index of the first token matching a predicate.
    pub(crate) fn find_token(&self, pred: impl Fn(&Token) -> bool) -> Option<usize> {
        self.tokens.iter().position(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::parse::parse_task_at;
    use crate::testutil::fixed_now;

    fn task(line: &str) -> Task {
        parse_task_at(line, fixed_now()).unwrap().0
    }

    #[test]
    fn test_to_line_joins_raws() {
        let t = task("read book +prj $c=2024-05-05T05-05");
        assert!(t.to_line().starts_with("read book +prj $c=2024-05-05T05-05"));
    }

    #[test]
    fn test_normalized_text_excludes_timestamps_and_id() {
        let a = task("read book $c=2024-05-05T05-05 $lud=2024-05-06T05-05 $id=1");
        let b = task("read book $c=2020-01-01T00-00 $lud=2020-01-02T00-00 $id=9");
        assert_eq!(a.normalized_text(), b.normalized_text());
        assert_eq!(a.normalized_text(), "read book");
    }

    #[test]
    fn test_plus_hints_in_order() {
        let t = task("x +beta @ctx +alpha");
        assert_eq!(t.plus_hints(), vec!["beta", "alpha"]);
    }

    #[test]
    fn test_regular_text_skips_typed_tokens() {
        let t = task("write (A) report +work");
        assert_eq!(t.regular_text(), "write report");
    }

    #[test]
    fn test_progress_percent_clamps() {
        let p = Progress {
            unit: "page".into(),
            category: String::new(),
            count: 12,
            done_count: 100,
        };
        assert_eq!(p.percent(), 12);
        assert_eq!(p.to_value(), "page/12/100");
    }

    #[test]
    fn test_progress_value_with_category() {
        let p = Progress {
            unit: "page".into(),
            category: "books".into(),
            count: 3,
            done_count: 9,
        };
        assert_eq!(p.to_value(), "page/books/3/9");
    }
}
