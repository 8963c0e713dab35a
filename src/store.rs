//! File boundary: directory layout, list files, done side-files.
//!
//! Layout under the config directory:
//!
//! - `<config>/todos/` user lists
//! - `<config>/todos/_etc/<name>.done` done side-files
//! - `<config>/todos/_archive/` archived lists
//! - `<config>/dotxt.yaml` configuration
//! - `<config>/dotxt.log` log file
//!
//! Every list path handed to the core must normalize to somewhere
//! under `todos/`; a bare basename resolves there directly.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the config directory.
pub const CONFIG_ENV: &str = "DOTXT_CONFIG";
/// Default config directory under `$HOME`.
pub const DEFAULT_CONFIG_DIR: &str = ".to-dotxt";
/// Default list name.
pub const DEFAULT_LIST: &str = "todo";

/// Resolved directory layout.
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
}

impl Paths {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Resolve the config directory: `--config` flag, then
    /// `DOTXT_CONFIG`, then `~/.to-dotxt/`.
    pub fn resolve(flag: Option<&str>) -> Result<Self> {
        if let Some(dir) = flag {
            return Ok(Self::new(dir));
        }
        if let Ok(dir) = env::var(CONFIG_ENV) {
            if !dir.is_empty() {
                return Ok(Self::new(dir));
            }
        }
        let home = env::var("HOME").map_err(|_| Error::Conf("HOME is not set".to_string()))?;
        Ok(Self::new(Path::new(&home).join(DEFAULT_CONFIG_DIR)))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("dotxt.yaml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.config_dir.join("dotxt.log")
    }

    pub fn todos_dir(&self) -> PathBuf {
        self.config_dir.join("todos")
    }

    pub fn etc_dir(&self) -> PathBuf {
        self.todos_dir().join("_etc")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.todos_dir().join("_archive")
    }

    /// Create the directory layout if missing.
    pub fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(self.etc_dir())?;
        fs::create_dir_all(self.archive_dir())?;
        Ok(())
    }

    /// Resolve a list name or path to a normalized path under
    /// `todos/`.
    ///
    /// A bare basename resolves to `todos/<basename>`. Anything else
    /// is normalized lexically and must stay under `todos/`. Symlinks
    /// are followed; a symlink to a directory or to a missing target
    /// fails.
    pub fn list_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(Error::Parse("empty list name".to_string()));
        }

        let candidate = Path::new(name);
        let raw = if candidate.components().count() == 1 && !candidate.is_absolute() {
            self.todos_dir().join(candidate)
        } else if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            let cwd = env::current_dir()?;
            cwd.join(candidate)
        };

        let normalized = normalize_lexically(&raw);
        if !normalized.starts_with(self.todos_dir()) {
            return Err(Error::Parse(format!(
                "{} is outside {}",
                normalized.display(),
                self.todos_dir().display()
            )));
        }

        follow_symlink(&normalized)
    }

    /// Companion done-file for a list.
    pub fn done_path(&self, list_name: &str) -> PathBuf {
        self.etc_dir().join(format!("{}.done", list_name))
    }

    /// Archived location of a list.
    pub fn archive_path(&self, list_name: &str) -> PathBuf {
        self.archive_dir().join(list_name)
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Follow a symlink one hop; reject directories and dangling targets.
fn follow_symlink(path: &Path) -> Result<PathBuf> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        // Not existing yet is fine: a first `add` creates the file.
        Err(_) => return Ok(path.to_path_buf()),
    };
    if !meta.file_type().is_symlink() {
        return Ok(path.to_path_buf());
    }
    let target = fs::canonicalize(path)
        .map_err(|_| Error::Parse(format!("dangling symlink: {}", path.display())))?;
    if target.is_dir() {
        return Err(Error::Parse(format!(
            "symlink to a directory: {}",
            path.display()
        )));
    }
    Ok(target)
}

/// Read a list file into lines. A missing file reads as empty.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::Io(format!("{}: {}", path.display(), e))),
    }
}

/// Write lines joined by `\n`, with a trailing newline.
pub fn store_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))
}

/// Append a block of lines to a done-file, guaranteeing exactly one
/// `\n` between the existing content and the new block.
pub fn append_done(path: &Path, lines: &[String]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = match fs::read_to_string(path) {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::Io(format!("{}: {}", path.display(), e))),
    };
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))
}

/// Remove lines from a done-file by 0-based index.
///
/// Returns the removed lines in descending-index order; the file is
/// rewritten without them.
pub fn remove_done(path: &Path, indices: &[usize]) -> Result<Vec<String>> {
    let mut lines = load_lines(path)?;

    let mut wanted: Vec<usize> = indices.to_vec();
    wanted.sort_unstable();
    wanted.dedup();
    wanted.reverse();

    let mut removed = Vec::new();
    for i in &wanted {
        if *i >= lines.len() {
            return Err(Error::NotFound(format!(
                "no line {} in {}",
                i,
                path.display()
            )));
        }
        removed.push(lines.remove(*i));
    }
    store_lines(path, &lines)?;
    Ok(removed)
}
