//! Token lexer for the task mini-language.
//!
//! A task line is split on ASCII spaces only; every other whitespace
//! character stays inside its token. Classification looks at the leading
//! character of each fragment and is purely structural — semantic
//! checks (date ordering, duplicate keys, cycle detection) happen later
//! in the parser and the list cleanup.

use chrono::NaiveDateTime;

use crate::task::model::Progress;

/// Hint sigils accepted by the lexer.
pub const HINT_SIGILS: &[char] = &['!', '?', '*', '&', '#', '@', '+'];

/// Dollar keys the lexer recognizes. Anything else falls through to text.
const DOLLAR_KEYS: &[&str] = &[
    "id", "-id", "P", "c", "lud", "due", "end", "dead", "r", "every", "p",
];

/// Classified token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain text, including everything that failed a stricter class.
    Text,
    /// `$id=` and `$P=` tokens.
    Id,
    /// Sigil-prefixed word (`+project`, `@context`, `#tag`, ...).
    Hint,
    /// `(A)` style priority.
    Priority,
    /// `$c=`, `$lud=`, `$due=`, `$end=`, `$dead=`, `$r=`.
    Date,
    /// `$every=`.
    Duration,
    /// `$p=`.
    Progress,
    /// Format flags: the collapsed id form `$-id=`.
    Format,
}

/// Typed payload attached to a token once the parser has validated it.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// No payload (text tokens, or typed tokens awaiting resolution).
    None,
    /// Integer payload (`$id=`, `$P=`).
    Int(i64),
    /// String payload (hint word, priority content).
    Str(String),
    /// Resolved absolute datetime.
    DateTime(NaiveDateTime),
    /// Duration in seconds (`$every=`).
    Dur(i64),
    /// Progress counter.
    Progress(Progress),
}

/// A classified fragment of a task line.
///
/// `raw` is the canonical serialized form and the single source of
/// truth for output; mutators rewrite it in place so that joining raws
/// with single spaces reproduces the task.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Key for `$key=value` tokens, or the sigil for hints.
    pub key: Option<String>,
    pub raw: String,
    pub value: TokenValue,
}

impl Token {
    /// A plain text token.
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Text,
            key: None,
            raw: raw.into(),
            value: TokenValue::None,
        }
    }

    /// The `<value>` part of a `$key=value` raw, if this is one.
    pub fn dollar_value(&self) -> Option<&str> {
        self.raw.strip_prefix('$')?.split_once('=').map(|(_, v)| v)
    }

    /// Demote this token to plain text, keeping `raw` verbatim.
    pub fn revert(&mut self) {
        self.kind = TokenKind::Text;
        self.key = None;
        self.value = TokenValue::None;
    }

    /// True for `$c=`, `$lud=`, `$due=`, `$end=`, `$dead=`, `$r=` with
    /// the given key.
    pub fn is_date(&self, key: &str) -> bool {
        self.kind == TokenKind::Date && self.key.as_deref() == Some(key)
    }
}

/// Split a line into classified tokens.
///
/// Demotions that happen here (one-character hints, blank priorities)
/// are reported as diagnostics so the parser can surface them under
/// `--debug`.
pub fn tokenize(line: &str) -> (Vec<Token>, Vec<String>) {
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    for fragment in line.split(' ') {
        if fragment.is_empty() {
            continue;
        }
        tokens.push(classify(fragment, &mut diagnostics));
    }

    (tokens, diagnostics)
}

fn classify(fragment: &str, diagnostics: &mut Vec<String>) -> Token {
    let first = fragment.chars().next().unwrap_or(' ');

    if HINT_SIGILS.contains(&first) {
        if fragment.chars().count() < 2 {
            diagnostics.push(format!("hint {:?} too short, kept as text", fragment));
            return Token::text(fragment);
        }
        return Token {
            kind: TokenKind::Hint,
            key: Some(first.to_string()),
            raw: fragment.to_string(),
            value: TokenValue::Str(fragment[first.len_utf8()..].to_string()),
        };
    }

    if first == '(' {
        if let Some(inner) = fragment.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            if inner.trim().is_empty() {
                diagnostics.push(format!("blank priority {:?}, kept as text", fragment));
                return Token::text(fragment);
            }
            return Token {
                kind: TokenKind::Priority,
                key: None,
                raw: fragment.to_string(),
                value: TokenValue::Str(inner.to_string()),
            };
        }
        return Token::text(fragment);
    }

    if first == '$' {
        return classify_dollar(fragment);
    }

    Token::text(fragment)
}

/// Classify a `$key=value` fragment; anything malformed is text.
///
/// Exactly one `=` is allowed, except that a `variable=` value carries
/// its own.
fn classify_dollar(fragment: &str) -> Token {
    let body = &fragment[1..];
    let (key, value) = match body.split_once('=') {
        Some(kv) => kv,
        None => return Token::text(fragment),
    };
    if value.contains('=') && !value.starts_with("variable=") {
        return Token::text(fragment);
    }
    if value.is_empty() || !DOLLAR_KEYS.contains(&key) {
        return Token::text(fragment);
    }

    let kind = match key {
        "id" | "P" => TokenKind::Id,
        "-id" => TokenKind::Format,
        "c" | "lud" | "due" | "end" | "dead" | "r" => TokenKind::Date,
        "every" => TokenKind::Duration,
        "p" => TokenKind::Progress,
        _ => unreachable!("key filtered above"),
    };

    Token {
        kind,
        key: Some(key.to_string()),
        raw: fragment.to_string(),
        // Typed payloads are filled in by the parser's resolution pass.
        value: TokenValue::None,
    }
}
