use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use tempfile::TempDir;

use dotxt::color::{strip_ansi, visible_width, ColorMode};
use dotxt::config::Config;
use dotxt::list::{List, ListStore};
use dotxt::recur;
use dotxt::render::Renderer;
use dotxt::sort::sorted_entries;
use dotxt::store::{self, Paths};
use dotxt::task::parse_task_at;
use dotxt::time;

/// Fixed clock for deterministic relative dates.
fn now() -> NaiveDateTime {
    time::parse_absolute("2026-03-01T12-00").unwrap()
}

/// Build an in-memory list from lines, parsed against the fixed clock.
fn list_at(lines: &[&str]) -> List {
    let mut list = List::new("todo", "/mem/todo");
    for line in lines {
        let (task, _) = parse_task_at(line, now()).unwrap();
        list.tasks.push(task);
    }
    list.cleanup();
    list
}

fn plain_config() -> Config {
    Config::default()
}

fn ansi_config() -> Config {
    Config {
        color_mode: ColorMode::Ansi,
        ..Config::default()
    }
}

/// Scratch config layout plus a loaded store for file-backed tests.
fn scratch() -> (TempDir, Paths) {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    paths.ensure_layout().unwrap();
    (temp, paths)
}

fn load(store: &mut ListStore, paths: &Paths, name: &str) -> PathBuf {
    let path = paths.list_path(name).unwrap();
    store.load(name, &path).unwrap();
    path
}

fn assert_invariants(list: &List) {
    // Dense ids form a permutation of [0, n).
    let mut ids: Vec<usize> = list.tasks.iter().map(|t| t.id.unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..list.tasks.len()).collect::<Vec<_>>());

    // eids unique.
    let mut eids: Vec<&str> = list.tasks.iter().filter_map(|t| t.eid.as_deref()).collect();
    let total = eids.len();
    eids.sort_unstable();
    eids.dedup();
    assert_eq!(eids.len(), total, "duplicate eids survived");

    // Every resolved parent matches a sibling's eid, acyclically.
    for (i, task) in list.tasks.iter().enumerate() {
        if let Some(p) = task.parent {
            let pid = task.pid.as_deref().expect("parent without pid");
            assert_eq!(list.tasks[p].eid.as_deref(), Some(pid));
        }
        // Walk up; must terminate without revisiting.
        let mut seen = vec![i];
        let mut cur = i;
        while let Some(p) = list.tasks[cur].parent {
            assert!(!seen.contains(&p), "cycle through task {}", p);
            seen.push(p);
            cur = p;
        }
    }

    // Temporal constraints hold for every task.
    for task in &list.tasks {
        let c = task.time.creation.expect("creation always set");
        let lud = task.time.last_updated.expect("lud always set");
        assert!(lud > c);
        if let Some(due) = task.time.due {
            assert!(due > c);
            if let Some(end) = task.time.end {
                assert!(end > due);
            }
            if let Some(dead) = task.time.dead {
                assert!(dead > due);
            }
            for r in &task.time.reminders {
                assert_ne!(*r, due);
                assert!(*r > c);
            }
        }
        assert!(!(task.time.end.is_some() && task.time.dead.is_some()));
        if let Some(p) = &task.progress {
            assert!(p.done_count >= 1);
            assert!(p.count >= 0 && p.count <= p.done_count);
        }
    }
}

/// Round-trip law: serialize then reparse yields equal field values.
fn assert_round_trip(list: &List) {
    for task in &list.tasks {
        let line = task.to_line();
        let (reparsed, _) = parse_task_at(&line, now()).unwrap();
        assert_eq!(task.time, reparsed.time, "line: {}", line);
        assert_eq!(task.priority, reparsed.priority);
        assert_eq!(task.progress, reparsed.progress);
        assert_eq!(task.eid, reparsed.eid);
        assert_eq!(task.pid, reparsed.pid);
        assert_eq!(line, reparsed.to_line());
    }
}

// S1: basic add & render.
#[test]
fn test_basic_add_and_render() {
    let list = list_at(&["read book"]);
    let renderer_config = plain_config();
    let renderer = Renderer::new(&renderer_config, 80, now());
    let out = renderer.render_list(&list);

    assert!(out[0].starts_with("> todo "));
    assert!(out[0].contains('\u{2014}'), "em-dash rule expected");
    assert!(out[1].starts_with("0 read book"), "line: {}", out[1]);
    assert!(out[1].contains("$c=rn"));
    assert!(out[1].contains("$lud=1s"));

    assert_invariants(&list);
    assert_round_trip(&list);
}

// S1, file-backed: add through the store, reload, and check shape.
#[test]
fn test_add_persists_and_reloads() {
    let (_temp, paths) = scratch();
    let mut store = ListStore::new();
    let path = load(&mut store, &paths, "todo");

    store.add(&path, "read book").unwrap();
    store.save(&path).unwrap();

    let mut fresh = ListStore::new();
    let path = load(&mut fresh, &paths, "todo");
    let list = fresh.get(&path).unwrap();
    assert_eq!(list.tasks.len(), 1);
    assert_eq!(list.tasks[0].regular_text(), "read book");
    assert!(list.tasks[0].time.creation.is_some());
    assert_invariants(list);
}

// S2: due recurrence rewrites the raw relative to creation.
#[test]
fn test_due_recurrence_advances_by_whole_years() {
    let mut list = list_at(&["(A) +prj $c=2024-05-05T05-05 $due=1m $every=1y"]);
    let old_due = list.tasks[0].time.due.unwrap();
    assert!(old_due < now());

    let advanced = recur::advance_list(&mut list, now());
    assert_eq!(advanced, 1);

    let task = &list.tasks[0];
    let new_due = task.time.due.unwrap();
    assert!(new_due > now());
    assert_eq!((new_due - old_due).num_seconds() % time::YEAR, 0);

    // Raw is now the relative form from $c=, and it reparses back.
    let line = task.to_line();
    assert!(line.contains("$due=2y1m"), "line: {}", line);
    let (reparsed, _) = parse_task_at(&line, now()).unwrap();
    assert_eq!(reparsed.time.due, Some(new_due));

    // No other fields changed.
    assert_eq!(task.priority.as_deref(), Some("A"));
    assert_eq!(task.time.end, None);
    assert_eq!(task.time.dead, None);
    assert_invariants(&list);
}

// S3: running event coloring.
#[test]
fn test_running_event_coloring() {
    let config = ansi_config();
    // due 4 days ago, end still a few days ahead.
    let c = time::format_absolute(now() - Duration::seconds(10 * time::DAY));
    let line = format!("standup notes $c={} $due=6d $end=1w", c);
    let list = list_at(&[line.as_str()]);

    let renderer = Renderer::new(&config, 120, now());
    let out = renderer.render_list(&list).join("\n");

    let escape = |hex: &str| {
        let (r, g, b) = dotxt::color::hex_to_rgb(hex).unwrap();
        format!("\x1b[38;2;{};{};{}m", r, g, b)
    };
    let burnt = escape(config.print.color("burnt"));
    let running = escape(config.print.color("running-event"));
    let running_text = escape(config.print.color("running-event-text"));

    assert!(out.contains(&burnt), "due token should be burnt");
    assert!(out.contains(&running), "end token should be running-event");
    // Both text tokens are dominated by running-event-text.
    assert!(out.matches(&running_text).count() >= 2, "out: {:?}", out);
}

// S4: parent/child sort.
#[test]
fn test_parent_child_sort_order() {
    let list = list_at(&["a", "b $id=1", "a.2 $P=1", "z.1 $P=1", "c"]);
    let order: Vec<String> = sorted_entries(&list)
        .iter()
        .map(|e| list.tasks[e.index].regular_text())
        .collect();
    assert_eq!(order, vec!["a", "b", "a.2", "z.1", "c"]);
    assert_invariants(&list);
}

// S5: dedup ignores timestamps and keeps the earlier task.
#[test]
fn test_dedup_ignores_timestamps() {
    let (_temp, paths) = scratch();
    let path = paths.list_path("todo").unwrap();
    store::store_lines(
        &path,
        &[
            "read book $c=2024-05-05T05-05".to_string(),
            "read book $c=2025-06-06T06-06".to_string(),
        ],
    )
    .unwrap();

    let mut store = ListStore::new();
    let path = load(&mut store, &paths, "todo");
    let removed = store.dedup(&path).unwrap();
    assert_eq!(removed, 1);

    let list = store.get(&path).unwrap();
    assert_eq!(list.tasks.len(), 1);
    assert!(list.tasks[0].to_line().contains("2024-05-05"));
    assert_invariants(list);
}

// S6: folding a 125-rune token at width 50.
#[test]
fn test_fold_long_token() {
    let config = ansi_config();
    let long = "=".repeat(125);
    let list = list_at(&[long.as_str()]);

    let renderer = Renderer::new(&config, 50, now());
    let out = renderer.render_list(&list);

    for line in &out {
        assert!(visible_width(line) <= 50, "too wide: {:?}", line);
    }
    let marks = out
        .iter()
        .flat_map(|l| strip_ansi(l).chars().collect::<Vec<_>>())
        .filter(|c| *c == '\\')
        .count();
    assert!(marks >= 2, "expected break markers, got {:?}", out);

    // No color escape was split: every ESC is followed by a complete
    // CSI sequence within the same physical line.
    for line in &out {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                assert_eq!(chars.next(), Some('['));
                assert!(
                    chars.by_ref().any(|n| n.is_ascii_alphabetic()),
                    "split escape in {:?}",
                    line
                );
            }
        }
    }
}

// Duration parser permutation boundary.
#[test]
fn test_duration_permutations_agree() {
    let a = time::parse_duration("+1y2m3w4d5h6M7S").unwrap();
    let b = time::parse_duration("2m4d3w7S6M1y5h").unwrap();
    assert_eq!(a, b);
    assert_eq!(time::format_duration_human(0), "rn");
    assert_eq!(time::format_duration_human(-10), "-10s");
}

// Invariants survive a mixed sequence of operations.
#[test]
fn test_invariants_across_operations() {
    let (_temp, paths) = scratch();
    let mut store = ListStore::new();
    let path = load(&mut store, &paths, "todo");

    for text in [
        "alpha $id=1",
        "beta $P=1",
        "(B) gamma +work",
        "delta $p=page/3/9",
        "epsilon $id=2 $P=2",
    ] {
        store.add(&path, text).unwrap();
    }
    {
        let list = store.get(&path).unwrap();
        assert_invariants(list);
        // The self-referencing $P=2 was broken.
        let eps = list
            .tasks
            .iter()
            .find(|t| t.regular_text() == "epsilon")
            .unwrap();
        assert_eq!(eps.pid, None);
    }

    store.delete(&path, &[1]).unwrap();
    assert_invariants(store.get(&path).unwrap());

    let list = store.get_mut(&path).unwrap();
    let id = list
        .tasks
        .iter()
        .find(|t| t.regular_text() == "gamma")
        .unwrap()
        .id
        .unwrap();
    list.task_mut(id).unwrap().append_text("$due=1w").unwrap();
    list.cleanup();
    assert_invariants(store.get(&path).unwrap());
    assert_round_trip(store.get(&path).unwrap());

    store.save(&path).unwrap();
    let mut fresh = ListStore::new();
    let path = load(&mut fresh, &paths, "todo");
    assert_invariants(fresh.get(&path).unwrap());
}

// Done-file separator and multi-revert ordering at the file level.
#[test]
fn test_done_file_contract() {
    let (_temp, paths) = scratch();
    let mut store = ListStore::new();
    let path = load(&mut store, &paths, "todo");
    for text in ["a", "b", "c"] {
        store.add(&path, text).unwrap();
    }

    let done_path = paths.done_path("todo");
    // Seed the done-file without a trailing newline; the append must
    // insert exactly one separator.
    fs::write(&done_path, "already done").unwrap();

    store.done(&path, &[0, 2], &done_path).unwrap();
    let content = fs::read_to_string(&done_path).unwrap();
    assert!(content.starts_with("already done\na"), "content: {}", content);
    assert!(!content.contains("\n\n"));

    // Multi-revert removes by index, descending.
    let removed = store::remove_done(&done_path, &[1, 2]).unwrap();
    assert!(removed[0].starts_with("c"), "removed: {:?}", removed);
    assert!(removed[1].starts_with("a"));
}

// Paths outside todos/ are rejected at the boundary.
#[test]
fn test_path_normalization_guard() {
    let (_temp, paths) = scratch();
    assert!(paths.list_path("work").is_ok());
    let escape = format!("{}/../escape", paths.todos_dir().display());
    assert!(paths.list_path(&escape).is_err());
    let outside = paths.config_dir().join("dotxt.yaml");
    assert!(paths.list_path(outside.to_str().unwrap()).is_err());
}

// Moving between lists preserves both lists' invariants.
#[test]
fn test_move_preserves_invariants() {
    let (_temp, paths) = scratch();
    let mut store = ListStore::new();
    let from = load(&mut store, &paths, "todo");
    let to = load(&mut store, &paths, "work");

    store.add(&from, "x $id=1").unwrap();
    store.add(&from, "y $P=1").unwrap();
    store.add(&to, "z $id=1").unwrap();

    store.move_task(&from, 0, &to).unwrap();
    assert_invariants(store.get(&from).unwrap());
    assert_invariants(store.get(&to).unwrap());

    // The moved task's duplicate eid reverted in the target list.
    let target = store.get(&to).unwrap();
    let eids: Vec<_> = target.tasks.iter().filter_map(|t| t.eid.as_deref()).collect();
    assert_eq!(eids.len(), 1);
}

// A list file with damaged tokens still loads; bad tokens are text.
#[test]
fn test_damaged_tokens_survive_as_text() {
    let (_temp, paths) = scratch();
    let path = paths.list_path("todo").unwrap();
    store::store_lines(
        &path,
        &[
            "task $due=notadate $every=5y2q # ()".to_string(),
            "ok task".to_string(),
        ],
    )
    .unwrap();

    let mut store = ListStore::new();
    let path = load(&mut store, &paths, "todo");
    let list = store.get(&path).unwrap();
    assert_eq!(list.tasks.len(), 2);
    let damaged = &list.tasks[0];
    assert_eq!(damaged.time.due, None);
    assert_eq!(damaged.time.every, None);
    // Raw fragments survive verbatim.
    let line = damaged.to_line();
    assert!(line.contains("$due=notadate"));
    assert!(line.contains("$every=5y2q"));
    assert!(line.contains('#'));
    assert!(line.contains("()"));
    assert_invariants(list);
}

fn write_config(paths: &Paths, yaml: &str) {
    fs::write(paths.config_file(), yaml).unwrap();
}

// Config-driven colors reach the renderer.
#[test]
fn test_config_colors_flow_to_renderer() {
    let (_temp, paths) = scratch();
    write_config(&paths, "print:\n  burnt: \"#010203\"\n");

    let cli = dotxt::config::parse_args(vec![
        "dotxt".to_string(),
        "print".to_string(),
        "--color".to_string(),
    ])
    .unwrap();
    let (config, diags) = Config::load(&paths, &cli).unwrap();
    assert!(diags.is_empty());

    let c = time::format_absolute(now() - Duration::seconds(10 * time::DAY));
    let late = format!("late $c={} $due=1d", c);
    let list = list_at(&[late.as_str()]);
    let out = Renderer::new(&config, 120, now()).render_list(&list).join("\n");
    assert!(out.contains("\x1b[38;2;1;2;3m"), "custom burnt color used");
}

#[test]
fn test_default_list_path_is_under_todos() {
    let (_temp, paths) = scratch();
    let path = paths.list_path(store::DEFAULT_LIST).unwrap();
    assert!(path.starts_with(paths.todos_dir()));
    assert!(path.ends_with(Path::new("todo")));
}
