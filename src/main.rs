use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use dotxt::config::{self, CliArgs, Command, Config};
use dotxt::error::{Error, Result};
use dotxt::list::ListStore;
use dotxt::log;
use dotxt::recur;
use dotxt::render::Renderer;
use dotxt::store::{Paths, DEFAULT_LIST};
use dotxt::time;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = env::args().collect();
    let cli = match config::parse_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    if cli.help || cli.command.is_none() && !cli.version {
        print_help();
        return;
    }

    if cli.version {
        println!("dotxt {}", VERSION);
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &CliArgs) -> Result<()> {
    let paths = Paths::resolve(cli.config.as_deref())?;
    paths.ensure_layout()?;

    let (config, config_diagnostics) = Config::load(&paths, cli)?;
    log::init(
        config.console_level,
        config.file_level,
        Some(paths.log_file()),
    );
    for diag in &config_diagnostics {
        log::warn(diag);
    }

    let command = cli.command.expect("checked in main");
    match command {
        Command::Add => cmd_add(cli, &paths),
        Command::Del => cmd_del(cli, &paths),
        Command::Append => cmd_edit_text(cli, &paths, EditKind::Append),
        Command::Prepend => cmd_edit_text(cli, &paths, EditKind::Prepend),
        Command::Replace => cmd_edit_text(cli, &paths, EditKind::Replace),
        Command::Dedup => cmd_dedup(cli, &paths),
        Command::Pri => cmd_pri(cli, &paths),
        Command::Depri => cmd_depri(cli, &paths),
        Command::Done => cmd_done(cli, &paths),
        Command::Revert => cmd_revert(cli, &paths),
        Command::Move => cmd_move(cli, &paths),
        Command::Migrate => cmd_migrate(cli, &paths),
        Command::Inc => cmd_inc(cli, &paths),
        Command::Print => cmd_print(cli, &paths, &config),
        Command::Lsn => cmd_lsn(cli, &paths, &config),
        Command::Check => cmd_check(cli, &paths),
        Command::Lists => cmd_lists(&paths),
        Command::Archive => cmd_archive(cli, &paths, true),
        Command::Unarchive => cmd_archive(cli, &paths, false),
    }
}

fn print_help() {
    println!(
        r#"dotxt - plain-text todo-list manager

USAGE:
    dotxt [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    add <text> --to=LIST          Add a task (creates the list if missing)
    del|rm <ids...> --from=LIST   Delete tasks by id
    app|append <id> <text> --to   Append text to a task
    prep|prepend <id> <text> --to Prepend text to a task
    replace|update <id> <text>    Replace a task's text (keeps creation)
    dedup --from=LIST             Remove duplicate tasks
    pri <id> <priority> --to      Set priority (no spaces)
    depri|dp <ids...> --from      Clear priorities
    do|done <ids...> --from       Move tasks to the done-file
    revert <ids...> --from        Restore tasks from the done-file
    mv|move <from> <id> <to>      Move a task between lists
    migrate <path> --to=LIST      Import tasks from an arbitrary file
    inc <id> [delta] --from       Adjust a progress count (default +1)
    print --from=LIST             Render a list
    lsn <id> --from=LIST          Print one task
    check [LIST...]               Advance overdue recurring tasks
    lists                         Enumerate list files
    archive <LIST>                Move a list into the archive
    unarchive <LIST>              Move a list out of the archive

OPTIONS:
    -h, --help          Show this help message
    -V, --version       Show version
    --config <PATH>     Config directory (default: ~/.to-dotxt/)
    --color             Colorize output with ANSI escapes
    --conky             Emit conky color tags instead
    --debug             Surface parse diagnostics

The DOTXT_CONFIG environment variable overrides the default config
directory. The default list is "todo"."#
    );
}

/// Resolve the target list from `--to`/`--from`, defaulting to `todo`.
fn resolve_list(cli: &CliArgs, paths: &Paths) -> Result<(String, PathBuf)> {
    let name = cli
        .to
        .as_deref()
        .or(cli.from.as_deref())
        .unwrap_or(DEFAULT_LIST);
    let path = paths.list_path(name)?;
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LIST)
        .to_string();
    Ok((stem, path))
}

fn load_list(store: &mut ListStore, cli: &CliArgs, name: &str, path: &Path) -> Result<()> {
    let diagnostics = store.load(name, path)?;
    report_diagnostics(cli, &diagnostics);
    Ok(())
}

fn report_diagnostics(cli: &CliArgs, diagnostics: &[String]) {
    for diag in diagnostics {
        log::debug(diag);
        if cli.debug {
            eprintln!("note: {}", diag);
        }
    }
}

fn parse_ids(cli: &CliArgs) -> Result<Vec<usize>> {
    if cli.positionals.is_empty() {
        return Err(Error::Args("expected at least one task id".to_string()));
    }
    cli.positionals
        .iter()
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| Error::Args(format!("not a task id: {}", s)))
        })
        .collect()
}

fn one_id(cli: &CliArgs) -> Result<usize> {
    let first = cli
        .positionals
        .first()
        .ok_or_else(|| Error::Args("expected a task id".to_string()))?;
    first
        .parse()
        .map_err(|_| Error::Args(format!("not a task id: {}", first)))
}

fn cmd_add(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let text = cli.positionals.join(" ");
    if text.trim().is_empty() {
        return Err(Error::Args("add needs task text".to_string()));
    }
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;
    let id = store.add(&path, &text)?;
    store.save(&path)?;
    log::info(&format!("added task {} to {}", id, name));
    println!("Added task {} to {}.", id, name);
    Ok(())
}

fn cmd_del(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let ids = parse_ids(cli)?;
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;
    let removed = store.delete(&path, &ids)?;
    store.save(&path)?;
    println!("Deleted {} task(s) from {}.", removed, name);
    Ok(())
}

enum EditKind {
    Append,
    Prepend,
    Replace,
}

fn cmd_edit_text(cli: &CliArgs, paths: &Paths, kind: EditKind) -> Result<()> {
    let id = one_id(cli)?;
    let text = cli.positionals[1..].join(" ");
    if text.trim().is_empty() {
        return Err(Error::Args("expected text after the task id".to_string()));
    }
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;

    let list = store.get_mut(&path)?;
    let task = list.task_mut(id)?;
    let diagnostics = match kind {
        EditKind::Append => task.append_text(&text)?,
        EditKind::Prepend => task.prepend_text(&text)?,
        EditKind::Replace => task.replace_text(&text)?,
    };
    list.cleanup();
    report_diagnostics(cli, &diagnostics);

    store.save(&path)?;
    println!("Updated task {} in {}.", id, name);
    Ok(())
}

fn cmd_dedup(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;
    let removed = store.dedup(&path)?;
    store.save(&path)?;
    println!("Removed {} duplicate(s) from {}.", removed, name);
    Ok(())
}

fn cmd_pri(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let id = one_id(cli)?;
    let priority = cli
        .positionals
        .get(1)
        .ok_or_else(|| Error::Args("pri needs a priority".to_string()))?
        .clone();
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;

    let list = store.get_mut(&path)?;
    list.task_mut(id)?.set_priority(&priority)?;
    list.cleanup();

    store.save(&path)?;
    println!("Prioritized task {} in {}.", id, name);
    Ok(())
}

fn cmd_depri(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let ids = parse_ids(cli)?;
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;

    let list = store.get_mut(&path)?;
    for id in &ids {
        list.task_mut(*id)?.clear_priority();
    }
    list.cleanup();

    store.save(&path)?;
    println!("Deprioritized {} task(s) in {}.", ids.len(), name);
    Ok(())
}

fn cmd_done(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let ids = parse_ids(cli)?;
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;
    let moved = store.done(&path, &ids, &paths.done_path(&name))?;
    store.save(&path)?;
    println!("Done: moved {} task(s) to {}.done.", moved, name);
    Ok(())
}

fn cmd_revert(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let indices = parse_ids(cli)?;
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;
    let restored = store.revert(&path, &indices, &paths.done_path(&name))?;
    store.save(&path)?;
    println!("Reverted {} task(s) into {}.", restored, name);
    Ok(())
}

fn cmd_move(cli: &CliArgs, paths: &Paths) -> Result<()> {
    if cli.positionals.len() != 3 {
        return Err(Error::Args("usage: dotxt mv <from> <id> <to>".to_string()));
    }
    let from_name = &cli.positionals[0];
    let id: usize = cli.positionals[1]
        .parse()
        .map_err(|_| Error::Args(format!("not a task id: {}", cli.positionals[1])))?;
    let to_name = &cli.positionals[2];

    let from = paths.list_path(from_name)?;
    let to = paths.list_path(to_name)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, from_name, &from)?;
    load_list(&mut store, cli, to_name, &to)?;

    store.move_task(&from, id, &to)?;
    store.save(&from)?;
    store.save(&to)?;
    println!("Moved task {} from {} to {}.", id, from_name, to_name);
    Ok(())
}

fn cmd_migrate(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let source = cli
        .positionals
        .first()
        .ok_or_else(|| Error::Args("migrate needs a source path".to_string()))?;
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;
    let imported = store.migrate(Path::new(source), &path)?;
    store.save(&path)?;
    println!("Migrated {} task(s) into {}.", imported, name);
    Ok(())
}

fn cmd_inc(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let id = one_id(cli)?;
    let delta: i64 = match cli.positionals.get(1) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Args(format!("not a delta: {}", raw)))?,
        None => 1,
    };
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;

    let list = store.get_mut(&path)?;
    list.task_mut(id)?.adjust_progress(delta)?;

    store.save(&path)?;
    println!("Adjusted progress of task {} in {}.", id, name);
    Ok(())
}

fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _rows)) => cols as usize,
        Err(_) => 100,
    }
}

fn cmd_print(cli: &CliArgs, paths: &Paths, config: &Config) -> Result<()> {
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;

    let renderer = Renderer::new(config, terminal_width(), time::now());
    for line in renderer.render_list(store.get(&path)?) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_lsn(cli: &CliArgs, paths: &Paths, config: &Config) -> Result<()> {
    let id = one_id(cli)?;
    let (name, path) = resolve_list(cli, paths)?;
    let mut store = ListStore::new();
    load_list(&mut store, cli, &name, &path)?;

    let renderer = Renderer::new(config, terminal_width(), time::now());
    for line in renderer.render_task(store.get(&path)?, id)? {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_check(cli: &CliArgs, paths: &Paths) -> Result<()> {
    let names: Vec<String> = if cli.positionals.is_empty() {
        list_names(paths)?
    } else {
        cli.positionals.clone()
    };

    let now = time::now();
    let mut advanced_total = 0;
    for name in &names {
        let path = paths.list_path(name)?;
        let mut store = ListStore::new();
        load_list(&mut store, cli, name, &path)?;
        let advanced = recur::advance_list(store.get_mut(&path)?, now);
        if advanced > 0 {
            store.save(&path)?;
            log::info(&format!("{}: advanced {} recurring task(s)", name, advanced));
        }
        advanced_total += advanced;
    }
    println!("Advanced {} recurring task(s).", advanced_total);
    Ok(())
}

fn list_names(paths: &Paths) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let dir = paths.todos_dir();
    if !dir.exists() {
        return Ok(names);
    }
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn cmd_lists(paths: &Paths) -> Result<()> {
    let names = list_names(paths)?;
    if names.is_empty() {
        println!("(no lists)");
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_archive(cli: &CliArgs, paths: &Paths, into: bool) -> Result<()> {
    let name = cli
        .positionals
        .first()
        .ok_or_else(|| Error::Args("expected a list name".to_string()))?;

    let live = paths.list_path(name)?;
    let archived = paths.archive_path(name);
    let (from, to) = if into {
        (live, archived)
    } else {
        (archived, live)
    };

    if !from.exists() {
        return Err(Error::NotFound(format!("{}", from.display())));
    }
    fs::rename(&from, &to)?;
    println!(
        "{} {}.",
        if into { "Archived" } else { "Unarchived" },
        name
    );
    Ok(())
}
