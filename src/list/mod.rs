//! List store: path-keyed task lists with invariant-restoring cleanup.
//!
//! Lists are owned by a single `ListStore` value that is threaded
//! through the operations; tests construct isolated instances instead
//! of sharing process state. Every structural change runs both
//! cleanups (dense ids, relations) before returning, so any read after
//! a mutation observes restored invariants.

mod cleanup;
mod ops;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::task::{parse_task, Task};

/// One list file's tasks plus its derived indices.
#[derive(Debug, Clone)]
pub struct List {
    /// Display name (the file stem).
    pub name: String,
    /// Normalized file path; the store key.
    pub path: PathBuf,
    /// Tasks in id order after cleanup.
    pub tasks: Vec<Task>,
    /// eid -> arena index, rebuilt on every structural change.
    pub eid_index: HashMap<String, usize>,
}

impl List {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            tasks: Vec::new(),
            eid_index: HashMap::new(),
        }
    }

    /// Parse raw file lines into tasks. Blank lines are skipped; a bad
    /// token never fails the file. Returns accumulated diagnostics.
    pub fn parse_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut diagnostics = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            match parse_task(line) {
                Ok((task, diags)) => {
                    self.tasks.push(task);
                    diagnostics.extend(diags);
                }
                Err(e) => diagnostics.push(format!("{}: {}", self.name, e)),
            }
        }
        self.cleanup();
        diagnostics
    }

    /// Serialize all tasks, one line each, in id order.
    pub fn to_lines(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.to_line()).collect()
    }

    /// Find the arena index of the task with dense id `id`.
    pub fn index_of(&self, id: usize) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == Some(id))
            .ok_or_else(|| Error::NotFound(format!("no task {} in {}", id, self.name)))
    }

    pub fn task(&self, id: usize) -> Result<&Task> {
        let i = self.index_of(id)?;
        Ok(&self.tasks[i])
    }

    pub fn task_mut(&mut self, id: usize) -> Result<&mut Task> {
        let i = self.index_of(id)?;
        Ok(&mut self.tasks[i])
    }

    /// Largest dense id, if the list is non-empty.
    pub fn max_id(&self) -> Option<usize> {
        self.tasks.iter().filter_map(|t| t.id).max()
    }
}

/// Process-local mapping from list path to loaded list.
#[derive(Debug, Default)]
pub struct ListStore {
    lists: HashMap<PathBuf, List>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, list: List) {
        self.lists.insert(list.path.clone(), list);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lists.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Result<&List> {
        self.lists
            .get(path)
            .ok_or_else(|| Error::ListNotInMemory(path.display().to_string()))
    }

    pub fn get_mut(&mut self, path: &Path) -> Result<&mut List> {
        self.lists
            .get_mut(path)
            .ok_or_else(|| Error::ListNotInMemory(path.display().to_string()))
    }

    pub fn remove(&mut self, path: &Path) -> Option<List> {
        self.lists.remove(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &List> {
        self.lists.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut List> {
        self.lists.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_from(lines: &[&str]) -> List {
        let mut list = List::new("todo", "/tmp/todo");
        list.parse_lines(lines.iter().copied());
        list
    }

    #[test]
    fn test_parse_lines_skips_blanks() {
        let list = list_from(&["a", "", "  ", "b"]);
        assert_eq!(list.tasks.len(), 2);
    }

    #[test]
    fn test_ids_assigned_in_order() {
        let list = list_from(&["a", "b", "c"]);
        let ids: Vec<_> = list.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_task_lookup_by_id() {
        let list = list_from(&["a", "b"]);
        assert!(list.task(1).is_ok());
        assert!(matches!(list.task(9), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_store_miss_is_list_not_in_memory() {
        let store = ListStore::new();
        let err = store.get(Path::new("/nope")).unwrap_err();
        assert!(matches!(err, Error::ListNotInMemory(_)));
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = ListStore::new();
        store.insert(list_from(&["a"]));
        assert!(store.get(Path::new("/tmp/todo")).is_ok());
    }
}
