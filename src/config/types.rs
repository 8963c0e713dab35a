//! Configuration types and defaults.
//!
//! Precedence (highest to lowest): CLI flags > `dotxt.yaml` > built-in
//! defaults. File values are validated strictly; a bad value costs one
//! diagnostic and falls back to the default, never aborting startup.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::color::ColorMode;
use crate::config::cli::CliArgs;
use crate::config::yaml;
use crate::error::Result;
use crate::store::Paths;

/// Named print colors and their defaults.
pub static DEFAULT_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("default", "#c8c8c8"),
        ("header", "#7c7c7c"),
        ("index", "#5f87af"),
        ("date-due", "#87d787"),
        ("running-event", "#5fd7ff"),
        ("running-event-text", "#87ffd7"),
        ("imminent-deadline", "#ff5f5f"),
        ("burnt", "#af5f00"),
        ("every", "#d787d7"),
        ("reminder", "#ffd75f"),
    ])
});

/// Hint sigil colors and their defaults.
pub static DEFAULT_HINT_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("+", "#5fafff"),
        ("@", "#5fd75f"),
        ("#", "#ffaf5f"),
        ("!", "#ff5f87"),
        ("?", "#d7af87"),
        ("*", "#ffd700"),
        ("&", "#87afd7"),
    ])
});

/// Quote highlight colors.
pub static DEFAULT_QUOTE_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([("single", "#afd75f"), ("double", "#87d7d7")])
});

/// Progress sub-token colors.
pub static DEFAULT_PROGRESS_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("count", "#d7d7af"),
        ("done-count", "#afafd7"),
        ("unit", "#87afaf"),
        ("bar-done", "#5fff87"),
        ("bar-todo", "#4e4e4e"),
    ])
});

/// Hue-spread palette parameters for ids and priorities.
#[derive(Debug, Clone, PartialEq)]
pub struct HuePalette {
    /// In `[0, 1)`.
    pub saturation: f64,
    /// In `[0, 1)`.
    pub lightness: f64,
    /// In `[0, 360]`.
    pub start_hue: f64,
    /// In `[0, 360]`.
    pub end_hue: f64,
}

/// Progress rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPrint {
    /// Sub-token colors, keyed like `DEFAULT_PROGRESS_COLORS`.
    pub colors: HashMap<String, String>,
    /// Bar width in cells, `[5, 50]`.
    pub bartext_len: usize,
    /// Percentage color interpolation endpoints, each in `[0, 1)`.
    pub start_saturation: f64,
    pub end_saturation: f64,
    pub start_lightness: f64,
    pub end_lightness: f64,
}

/// Print configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintConfig {
    /// Named colors, keyed like `DEFAULT_COLORS`.
    pub colors: HashMap<String, String>,
    /// Hint sigil colors.
    pub hints: HashMap<String, String>,
    /// Quote highlight colors (`single`, `double`).
    pub quotes: HashMap<String, String>,
    pub progress: ProgressPrint,
    pub ids: HuePalette,
    pub priority: HuePalette,
}

impl PrintConfig {
    /// Look up a named color, falling back to the built-in default.
    pub fn color(&self, key: &str) -> &str {
        if let Some(hex) = self.colors.get(key) {
            return hex;
        }
        DEFAULT_COLORS.get(key).copied().unwrap_or("#c8c8c8")
    }

    /// Look up a hint sigil color.
    pub fn hint_color(&self, sigil: &str) -> &str {
        if let Some(hex) = self.hints.get(sigil) {
            return hex;
        }
        DEFAULT_HINT_COLORS.get(sigil).copied().unwrap_or("#c8c8c8")
    }

    /// Look up a progress sub-token color.
    pub fn progress_color(&self, key: &str) -> &str {
        if let Some(hex) = self.progress.colors.get(key) {
            return hex;
        }
        DEFAULT_PROGRESS_COLORS.get(key).copied().unwrap_or("#c8c8c8")
    }

    /// Look up a quote color (`single` or `double`).
    pub fn quote_color(&self, kind: &str) -> &str {
        if let Some(hex) = self.quotes.get(kind) {
            return hex;
        }
        DEFAULT_QUOTE_COLORS.get(kind).copied().unwrap_or("#c8c8c8")
    }
}

/// dotxt configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Console log threshold, `-1..5` (`-1` = off).
    pub console_level: i32,
    /// File log threshold, `-1..5`.
    pub file_level: i32,
    /// Surface parse diagnostics on stderr.
    pub debug: bool,
    /// Color output flavor.
    pub color_mode: ColorMode,
    pub print: PrintConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            console_level: 1,
            file_level: 2,
            debug: false,
            color_mode: ColorMode::Plain,
            print: PrintConfig {
                colors: HashMap::new(),
                hints: HashMap::new(),
                quotes: HashMap::new(),
                progress: ProgressPrint {
                    colors: HashMap::new(),
                    bartext_len: 20,
                    start_saturation: 0.7,
                    end_saturation: 0.7,
                    start_lightness: 0.35,
                    end_lightness: 0.55,
                },
                ids: HuePalette {
                    saturation: 0.6,
                    lightness: 0.55,
                    start_hue: 20.0,
                    end_hue: 340.0,
                },
                priority: HuePalette {
                    saturation: 0.8,
                    lightness: 0.55,
                    start_hue: 0.0,
                    end_hue: 300.0,
                },
            },
        }
    }
}

impl Config {
    /// Load configuration: file layer first, then CLI flags on top.
    ///
    /// Returns the config plus one diagnostic per rejected file value.
    pub fn load(paths: &Paths, cli: &CliArgs) -> Result<(Self, Vec<String>)> {
        let mut config = Self::default();
        let diagnostics = yaml::apply_file(&mut config, &paths.config_file());
        config.apply_cli(cli);
        Ok((config, diagnostics))
    }

    /// Apply CLI flags (highest precedence).
    pub(super) fn apply_cli(&mut self, cli: &CliArgs) {
        if cli.conky {
            self.color_mode = ColorMode::Conky;
        } else if cli.color {
            self.color_mode = ColorMode::Ansi;
        }
        if cli.debug {
            self.debug = true;
            if self.console_level < 4 {
                self.console_level = 4;
            }
        }
    }
}
