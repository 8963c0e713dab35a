//! Stable multi-key task ordering with parent/child grouping.
//!
//! Sorting is a display concern: it never mutates the list, it
//! produces an ordered sequence of arena indices with a depth for
//! indentation. Children are detached from the top level, sorted with
//! the same keys, and emitted immediately after their parent.

use std::cmp::Ordering;

use crate::list::List;
use crate::task::Task;

/// One display slot: which task, and how deep under its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub index: usize,
    pub depth: usize,
}

/// Comparison key, earlier fields dominant:
/// progress (present and started, present, absent), category
/// (empty last), priority (present first), plus-hints (empty last),
/// then normalized regular text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    progress_rank: u8,
    category_empty: bool,
    category: String,
    priority_absent: bool,
    priority: String,
    hints_empty: bool,
    hints: String,
    text: String,
}

fn sort_key(task: &Task) -> SortKey {
    let progress_rank = match &task.progress {
        Some(p) if p.done_count > 0 => 0,
        Some(_) => 1,
        None => 2,
    };
    let category = task.category().to_string();
    let mut hint_words: Vec<&str> = task.plus_hints();
    hint_words.sort_unstable();
    let hints = hint_words.join(" ");

    SortKey {
        progress_rank,
        category_empty: category.is_empty(),
        category,
        priority_absent: task.priority.is_none(),
        priority: task.priority.clone().unwrap_or_default(),
        hints_empty: hints.is_empty(),
        hints,
        text: task.regular_text(),
    }
}

fn compare(list: &List, a: usize, b: usize) -> Ordering {
    sort_key(&list.tasks[a]).cmp(&sort_key(&list.tasks[b]))
}

/// Produce the display order for a list.
pub fn sorted_entries(list: &List) -> Vec<Entry> {
    let mut top: Vec<usize> = (0..list.tasks.len())
        .filter(|&i| list.tasks[i].parent.is_none())
        .collect();
    top.sort_by(|&a, &b| compare(list, a, b));

    let mut out = Vec::with_capacity(list.tasks.len());
    for index in top {
        emit(list, index, 0, &mut out);
    }
    out
}

fn emit(list: &List, index: usize, depth: usize, out: &mut Vec<Entry>) {
    out.push(Entry { index, depth });
    let mut kids = list.tasks[index].children.clone();
    kids.sort_by(|&a, &b| compare(list, a, b));
    for kid in kids {
        emit(list, kid, depth + 1, out);
    }
}
