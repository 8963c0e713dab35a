//! CLI argument parsing.

use crate::error::{Error, Result};

/// CLI arguments parsed from the command line.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Subcommand to execute.
    pub command: Option<Command>,
    /// Positional arguments after the command.
    pub positionals: Vec<String>,
    /// Config directory override.
    pub config: Option<String>,
    /// Target list (`--to`).
    pub to: Option<String>,
    /// Source list (`--from`).
    pub from: Option<String>,
    /// Enable ANSI colors.
    pub color: bool,
    /// Emit conky color tags instead of ANSI escapes.
    pub conky: bool,
    /// Surface parse diagnostics and debug logging.
    pub debug: bool,
    /// Show help.
    pub help: bool,
    /// Show version.
    pub version: bool,
}

/// dotxt subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Add a task to a list.
    Add,
    /// Delete tasks by id.
    Del,
    /// Append text to a task.
    Append,
    /// Prepend text to a task.
    Prepend,
    /// Replace a task's text.
    Replace,
    /// Remove duplicate tasks.
    Dedup,
    /// Set a task's priority.
    Pri,
    /// Clear priorities.
    Depri,
    /// Move tasks to the done-file.
    Done,
    /// Restore tasks from the done-file.
    Revert,
    /// Move a task between lists.
    Move,
    /// Import tasks from an arbitrary file.
    Migrate,
    /// Adjust a progress count.
    Inc,
    /// Render a list.
    Print,
    /// Print one task.
    Lsn,
    /// Run the recurrence engine.
    Check,
    /// Enumerate list files.
    Lists,
    /// Move a list into the archive.
    Archive,
    /// Move a list out of the archive.
    Unarchive,
}

impl Command {
    /// Parse a command name, including aliases.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Self::Add),
            "del" | "rm" => Some(Self::Del),
            "app" | "append" => Some(Self::Append),
            "prep" | "prepend" => Some(Self::Prepend),
            "replace" | "update" => Some(Self::Replace),
            "dedup" => Some(Self::Dedup),
            "pri" => Some(Self::Pri),
            "depri" | "dp" => Some(Self::Depri),
            "do" | "done" => Some(Self::Done),
            "revert" => Some(Self::Revert),
            "mv" | "move" => Some(Self::Move),
            "migrate" => Some(Self::Migrate),
            "inc" => Some(Self::Inc),
            "print" => Some(Self::Print),
            "lsn" => Some(Self::Lsn),
            "check" => Some(Self::Check),
            "lists" => Some(Self::Lists),
            "archive" => Some(Self::Archive),
            "unarchive" => Some(Self::Unarchive),
            _ => None,
        }
    }
}

/// Parse CLI arguments from an iterator.
///
/// Flags take `--flag=value` or `--flag value` form. The first
/// non-flag word is the command; everything after it that is not a
/// flag is a positional.
pub fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();

    // Skip program name.
    args.next();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with('-') => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };

        let take = |args: &mut I::IntoIter, name: &str| -> Result<String> {
            match inline.clone().or_else(|| args.next()) {
                Some(v) => Ok(v),
                None => Err(Error::Args(format!("{} needs a value", name))),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => cli.help = true,
            "-V" | "--version" => cli.version = true,
            "--config" => cli.config = Some(take(&mut args, "--config")?),
            "--to" => cli.to = Some(take(&mut args, "--to")?),
            "--from" => cli.from = Some(take(&mut args, "--from")?),
            "--color" => cli.color = true,
            "--conky" => cli.conky = true,
            "--debug" => cli.debug = true,
            _ if is_flag(&flag) => {
                return Err(Error::Args(format!("unknown flag: {}", flag)));
            }
            _ if cli.command.is_none() => {
                cli.command = Command::from_str(&arg);
                if cli.command.is_none() {
                    return Err(Error::Args(format!("unknown command: {}", arg)));
                }
            }
            _ => cli.positionals.push(arg),
        }
    }

    Ok(cli)
}

/// A word is a flag when it starts with `-` but is not a negative
/// number (progress deltas like `-1` are positionals).
fn is_flag(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some('-')) && !matches!(chars.next(), Some(c) if c.is_ascii_digit())
}
