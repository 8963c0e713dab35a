//! Invariant-restoring cleanups.
//!
//! Two passes run after every structural change. Dense-id cleanup
//! makes the id set a permutation of `[0, n)`. Relation cleanup
//! rebuilds the eid index, reverts duplicate eids and cycle-closing
//! parent references, and repopulates the parent/children pointers.

use std::collections::{HashMap, HashSet};

use crate::list::List;
use crate::task::token::TokenKind;

impl List {
    /// Restore all list invariants.
    pub fn cleanup(&mut self) {
        self.dense_ids();
        self.relations();
    }

    /// Reassign dense ids so they form a permutation of `[0, n)`.
    ///
    /// Duplicate or out-of-range ids are dropped, then unassigned
    /// tasks take the smallest free slot in list order, and finally
    /// the tasks are stable-sorted by id.
    fn dense_ids(&mut self) {
        let n = self.tasks.len();
        let mut used = HashSet::new();

        for task in &mut self.tasks {
            if let Some(id) = task.id {
                if id >= n || !used.insert(id) {
                    task.id = None;
                }
            }
        }

        let mut free: Vec<usize> = (0..n).filter(|i| !used.contains(i)).collect();
        free.reverse(); // pop() takes the smallest
        for task in &mut self.tasks {
            if task.id.is_none() {
                task.id = free.pop();
            }
        }

        self.tasks.sort_by_key(|t| t.id);
    }

    /// Rebuild the eid index and the parent/children pointers.
    fn relations(&mut self) {
        // Forward scan: later duplicate eids revert to text.
        self.eid_index.clear();
        for i in 0..self.tasks.len() {
            let eid = match self.tasks[i].eid.clone() {
                Some(eid) => eid,
                None => continue,
            };
            if self.eid_index.contains_key(&eid) {
                self.revert_eid(i);
            } else {
                self.eid_index.insert(eid, i);
            }
        }

        // Cycle detection: walking pid -> eid must never revisit a
        // node; the $P= that would close a cycle reverts.
        for start in 0..self.tasks.len() {
            if self.tasks[start].pid.is_none() {
                continue;
            }
            let mut visited = HashSet::new();
            visited.insert(start);
            let mut current = start;
            loop {
                let pid = match self.tasks[current].pid.clone() {
                    Some(pid) => pid,
                    None => break,
                };
                let target = match self.eid_index.get(&pid) {
                    Some(&t) => t,
                    // Dangling pid: kept as a pending reference.
                    None => break,
                };
                if !visited.insert(target) {
                    self.revert_pid(current);
                    break;
                }
                current = target;
            }
        }

        // Populate the computed pointers.
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..self.tasks.len() {
            self.tasks[i].parent = None;
            self.tasks[i].children.clear();
        }
        for i in 0..self.tasks.len() {
            if let Some(pid) = &self.tasks[i].pid {
                if let Some(&p) = self.eid_index.get(pid) {
                    self.tasks[i].parent = Some(p);
                    children.entry(p).or_default().push(i);
                }
            }
        }
        for (p, kids) in children {
            self.tasks[p].children = kids;
        }
    }

    fn revert_eid(&mut self, i: usize) {
        let task = &mut self.tasks[i];
        task.eid = None;
        for token in &mut task.tokens {
            if (token.kind == TokenKind::Id && token.key.as_deref() == Some("id"))
                || token.kind == TokenKind::Format
            {
                token.revert();
            }
        }
    }

    fn revert_pid(&mut self, i: usize) {
        let task = &mut self.tasks[i];
        task.pid = None;
        for token in &mut task.tokens {
            if token.kind == TokenKind::Id && token.key.as_deref() == Some("P") {
                token.revert();
            }
        }
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

    fn assert_dense(list: &List) {
        let mut ids: Vec<usize> = list.tasks.iter().map(|t| t.id.unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..list.tasks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_dense_ids_after_load() {
        let list = list_from(&["a", "b", "c"]);
        assert_dense(&list);
    }

    #[test]
    fn test_dense_ids_fill_freed_slots_ascending() {
        let mut list = list_from(&["a", "b", "c", "d"]);
        // Simulate structural damage: drop two, unset one.
        list.tasks.remove(1);
        list.tasks[2].id = None;
        list.cleanup();
        assert_dense(&list);
        // Remaining "a" keeps 0, "c" keeps 2, "d" fills 1.
        assert_eq!(list.task(0).unwrap().regular_text(), "a");
        assert_eq!(list.task(2).unwrap().regular_text(), "c");
        assert_eq!(list.task(1).unwrap().regular_text(), "d");
    }

    #[test]
    fn test_duplicate_eid_reverts_later_occurrence() {
        let list = list_from(&["a $id=1", "b $id=1"]);
        assert_eq!(list.tasks[0].eid.as_deref(), Some("1"));
        assert_eq!(list.tasks[1].eid, None);
        // Raw survives as text.
        assert!(list.tasks[1].to_line().contains("$id=1"));
    }

    #[test]
    fn test_parent_child_pointers() {
        let list = list_from(&["p $id=1", "kid $P=1"]);
        let parent = list.eid_index["1"];
        let kid = 1 - parent; // two tasks only
        assert_eq!(list.tasks[kid].parent, Some(parent));
        assert_eq!(list.tasks[parent].children, vec![kid]);
    }

    #[test]
    fn test_two_node_cycle_broken() {
        let list = list_from(&["a $id=1 $P=2", "b $id=2 $P=1"]);
        let reverted = list.tasks.iter().filter(|t| t.pid.is_none()).count();
        assert_eq!(reverted, 1, "exactly one $P= reverts");
        // The survivor still resolves to a parent.
        let kept: Vec<_> = list.tasks.iter().filter(|t| t.pid.is_some()).collect();
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_self_cycle_broken() {
        let list = list_from(&["a $id=1 $P=1"]);
        assert_eq!(list.tasks[0].pid, None);
        assert!(list.tasks[0].to_line().contains("$P=1"));
    }

    #[test]
    fn test_dangling_pid_kept_pending() {
        let list = list_from(&["a $P=9"]);
        assert_eq!(list.tasks[0].pid.as_deref(), Some("9"));
        assert_eq!(list.tasks[0].parent, None);
    }

    #[test]
    fn test_chain_is_not_a_cycle() {
        let list = list_from(&["a $id=1", "b $id=2 $P=1", "c $P=2"]);
        assert!(list.tasks.iter().all(|t| t.pid.is_some() || t.eid.as_deref() == Some("1")));
        let c = list.tasks.iter().position(|t| t.regular_text() == "c").unwrap();
        assert!(list.tasks[c].parent.is_some());
    }
}
