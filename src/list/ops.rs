//! List operations: add, delete, move, dedup, done, revert, migrate.
//!
//! Structural changes always finish with `cleanup()`, so callers
//! observe restored invariants. File writes stay at the boundary: the
//! command layer loads, calls one of these, then stores — an error
//! anywhere prevents the store step.

use std::path::Path;

use crate::error::{Error, Result};
use crate::list::{List, ListStore};
use crate::store;
use crate::task::parse_task;

impl ListStore {
    /// Load a list file into the store if it is not already loaded.
    /// Returns any parse diagnostics.
    pub fn load(&mut self, name: &str, path: &Path) -> Result<Vec<String>> {
        if self.contains(path) {
            return Ok(Vec::new());
        }
        let lines = store::load_lines(path)?;
        let mut list = List::new(name, path);
        let diagnostics = list.parse_lines(lines.iter().map(String::as_str));
        self.insert(list);
        Ok(diagnostics)
    }

    /// Write a loaded list back to its file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let list = self.get(path)?;
        store::store_lines(path, &list.to_lines())
    }

    /// Parse `text` and append it as a new task. Returns the dense id
    /// it received.
    pub fn add(&mut self, path: &Path, text: &str) -> Result<usize> {
        let (task, _diags) = parse_task(text)?;
        let list = self.get_mut(path)?;
        list.tasks.push(task);
        list.cleanup();
        // The new task is the one that just received the largest id.
        let id = list.tasks.len() - 1;
        Ok(id)
    }

    /// Delete tasks by dense id.
    pub fn delete(&mut self, path: &Path, ids: &[usize]) -> Result<usize> {
        let list = self.get_mut(path)?;
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids {
            indices.push(list.index_of(*id)?);
        }
        indices.sort_unstable();
        indices.dedup();
        for i in indices.iter().rev() {
            list.tasks.remove(*i);
        }
        let removed = indices.len();
        list.cleanup();
        Ok(removed)
    }

    /// Move a task between lists. Both must be loaded.
    pub fn move_task(&mut self, from: &Path, id: usize, to: &Path) -> Result<()> {
        if from == to {
            return Ok(());
        }
        // Both ends checked before anything is detached.
        self.get(to)?;
        let source = self.get_mut(from)?;
        let i = source.index_of(id)?;
        let mut task = source.tasks.remove(i);
        source.cleanup();

        task.id = None;
        let target = self.get_mut(to)?;
        target.tasks.push(task);
        target.cleanup();
        Ok(())
    }

    /// Remove duplicate tasks, keeping the earliest in list order.
    ///
    /// Two tasks are duplicates iff their normalized text (raws joined
    /// by single spaces, `$c=`/`$lud=`/`$id=` excluded) is byte-equal.
    pub fn dedup(&mut self, path: &Path) -> Result<usize> {
        let list = self.get_mut(path)?;
        let mut seen = std::collections::HashSet::new();
        let before = list.tasks.len();
        list.tasks.retain(|t| seen.insert(t.normalized_text()));
        let removed = before - list.tasks.len();
        if removed > 0 {
            list.cleanup();
        }
        Ok(removed)
    }

    /// Move tasks to the companion done-file.
    pub fn done(&mut self, path: &Path, ids: &[usize], done_path: &Path) -> Result<usize> {
        let list = self.get_mut(path)?;
        let mut indices = Vec::with_capacity(ids.len());
        for id in ids {
            indices.push(list.index_of(*id)?);
        }
        indices.sort_unstable();
        indices.dedup();

        let lines: Vec<String> = indices.iter().map(|&i| list.tasks[i].to_line()).collect();
        store::append_done(done_path, &lines)?;

        for i in indices.iter().rev() {
            list.tasks.remove(*i);
        }
        let moved = indices.len();
        list.cleanup();
        Ok(moved)
    }

    /// Restore tasks from the done-file by line index.
    pub fn revert(&mut self, path: &Path, indices: &[usize], done_path: &Path) -> Result<usize> {
        if indices.is_empty() {
            return Err(Error::Args("revert needs at least one index".to_string()));
        }
        let removed = store::remove_done(done_path, indices)?;
        let list = self.get_mut(path)?;
        let mut restored = 0;
        for line in &removed {
            if line.trim().is_empty() {
                continue;
            }
            let (task, _diags) = parse_task(line)?;
            list.tasks.push(task);
            restored += 1;
        }
        list.cleanup();
        Ok(restored)
    }

    /// Import task lines from an arbitrary readable file.
    pub fn migrate(&mut self, source: &Path, path: &Path) -> Result<usize> {
        let lines = store::load_lines(source)?;
        if lines.is_empty() {
            return Err(Error::NotFound(format!("nothing to migrate in {}", source.display())));
        }
        let list = self.get_mut(path)?;
        let mut imported = 0;
        for line in &lines {
            if line.trim().is_empty() {
                continue;
            }
            let (task, _diags) = parse_task(line)?;
            list.tasks.push(task);
            imported += 1;
        }
        list.cleanup();
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn store_with(lines: &[&str]) -> (ListStore, PathBuf) {
        let mut store = ListStore::new();
        let path = PathBuf::from("/mem/todo");
        let mut list = List::new("todo", &path);
        list.parse_lines(lines.iter().copied());
        store.insert(list);
        (store, path)
    }

    fn texts(store: &ListStore, path: &Path) -> Vec<String> {
        store
            .get(path)
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.regular_text())
            .collect()
    }

    #[test]
    fn test_add_assigns_next_id() {
        let (mut store, path) = store_with(&["a"]);
        let id = store.add(&path, "b").unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.get(&path).unwrap().task(1).unwrap().regular_text(), "b");
    }

    #[test]
    fn test_add_empty_fails() {
        let (mut store, path) = store_with(&[]);
        assert_eq!(store.add(&path, "  ").unwrap_err(), Error::EmptyText);
    }

    #[test]
    fn test_delete_reassigns_dense_ids() {
        let (mut store, path) = store_with(&["a", "b", "c"]);
        store.delete(&path, &[1]).unwrap();
        let list = store.get(&path).unwrap();
        assert_eq!(list.tasks.len(), 2);
        let mut ids: Vec<_> = list.tasks.iter().map(|t| t.id.unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_delete_unknown_id_fails() {
        let (mut store, path) = store_with(&["a"]);
        assert!(matches!(store.delete(&path, &[7]), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_move_between_lists() {
        let (mut store, from) = store_with(&["a", "b"]);
        let to = PathBuf::from("/mem/work");
        store.insert(List::new("work", &to));

        store.move_task(&from, 0, &to).unwrap();
        assert_eq!(texts(&store, &from), vec!["b"]);
        assert_eq!(texts(&store, &to), vec!["a"]);
        assert_eq!(store.get(&to).unwrap().tasks[0].id, Some(0));
    }

    #[test]
    fn test_move_to_unloaded_list_fails() {
        let (mut store, from) = store_with(&["a"]);
        let err = store.move_task(&from, 0, Path::new("/mem/nope")).unwrap_err();
        assert!(matches!(err, Error::ListNotInMemory(_)));
        // Source untouched.
        assert_eq!(texts(&store, &from), vec!["a"]);
    }

    #[test]
    fn test_dedup_keeps_earlier() {
        let (mut store, path) = store_with(&[
            "read book $c=2024-05-05T05-05 $id=1",
            "read book $c=2020-01-01T00-00",
        ]);
        let removed = store.dedup(&path).unwrap();
        assert_eq!(removed, 1);
        let list = store.get(&path).unwrap();
        assert_eq!(list.tasks.len(), 1);
        // The earlier line survived.
        assert!(list.tasks[0].to_line().contains("2024-05-05"));
    }

    #[test]
    fn test_done_and_revert_round_trip() {
        let temp = TempDir::new().unwrap();
        let done_path = temp.path().join("todo.done");
        let (mut store, path) = store_with(&["a", "b", "c"]);

        store.done(&path, &[1], &done_path).unwrap();
        assert_eq!(texts(&store, &path), vec!["a", "c"]);
        let done_lines = store::load_lines(&done_path).unwrap();
        assert_eq!(done_lines.len(), 1);
        assert!(done_lines[0].starts_with("b"));

        store.revert(&path, &[0], &done_path).unwrap();
        assert_eq!(store.get(&path).unwrap().tasks.len(), 3);
        assert!(store::load_lines(&done_path).unwrap().is_empty());
    }

    #[test]
    fn test_multi_revert_descending() {
        let temp = TempDir::new().unwrap();
        let done_path = temp.path().join("todo.done");
        store::store_lines(&done_path, &["a".into(), "b".into(), "c".into()]).unwrap();
        let (mut store, path) = store_with(&[]);

        let restored = store.revert(&path, &[0, 2], &done_path).unwrap();
        assert_eq!(restored, 2);
        assert_eq!(store::load_lines(&done_path).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_migrate_imports_lines() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("import.txt");
        store::store_lines(&source, &["x".into(), String::new(), "y".into()]).unwrap();
        let (mut store, path) = store_with(&["a"]);

        let imported = store.migrate(&source, &path).unwrap();
        assert_eq!(imported, 2);
        assert_eq!(store.get(&path).unwrap().tasks.len(), 3);
    }
}
