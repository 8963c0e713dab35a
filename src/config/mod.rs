//! Configuration loading for dotxt.
//!
//! Sources, highest precedence first: CLI flags, `<config>/dotxt.yaml`,
//! built-in defaults. The config directory itself comes from
//! `--config`, then `DOTXT_CONFIG`, then `~/.to-dotxt/`.

mod cli;
mod types;
mod yaml;

pub use cli::{parse_args, CliArgs, Command};
pub use types::{Config, HuePalette, PrintConfig, ProgressPrint};

#[cfg(test)]
mod tests;
