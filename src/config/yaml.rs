//! `dotxt.yaml` file layer.
//!
//! The file is deserialized loosely (every field optional, unknown
//! keys tolerated) and then validated key by key: a value out of range
//! or of the wrong shape produces one diagnostic and leaves the
//! default in place. A file that fails to parse at all costs a single
//! diagnostic and the defaults survive untouched.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::color::is_hex_color;
use crate::config::types::{
    Config, DEFAULT_COLORS, DEFAULT_HINT_COLORS, DEFAULT_PROGRESS_COLORS, DEFAULT_QUOTE_COLORS,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    logging: RawLogging,
    print: RawPrint,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    #[serde(rename = "console-level")]
    console_level: Option<i64>,
    #[serde(rename = "file-level")]
    file_level: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPrint {
    hints: HashMap<String, serde_yaml::Value>,
    quotes: HashMap<String, serde_yaml::Value>,
    progress: RawProgress,
    ids: RawPalette,
    priority: RawPalette,
    #[serde(flatten)]
    colors: HashMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProgress {
    #[serde(rename = "bartext-len")]
    bartext_len: Option<i64>,
    percentage: RawPercentage,
    #[serde(flatten)]
    colors: HashMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPercentage {
    #[serde(rename = "start-saturation")]
    start_saturation: Option<f64>,
    #[serde(rename = "end-saturation")]
    end_saturation: Option<f64>,
    #[serde(rename = "start-lightness")]
    start_lightness: Option<f64>,
    #[serde(rename = "end-lightness")]
    end_lightness: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPalette {
    saturation: Option<f64>,
    lightness: Option<f64>,
    #[serde(rename = "start-hue")]
    start_hue: Option<f64>,
    #[serde(rename = "end-hue")]
    end_hue: Option<f64>,
}

/// Merge `dotxt.yaml` into `config`. Returns one diagnostic per
/// rejected key; a missing file is not an error.
pub(super) fn apply_file(config: &mut Config, path: &Path) -> Vec<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };
    let raw: RawConfig = match serde_yaml::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => return vec![format!("{}: {}", path.display(), e)],
    };

    let mut diagnostics = Vec::new();
    apply_raw(config, raw, &mut diagnostics);
    diagnostics
}

fn apply_raw(config: &mut Config, raw: RawConfig, diagnostics: &mut Vec<String>) {
    if let Some(level) = raw.logging.console_level {
        match check_level(level) {
            Some(v) => config.console_level = v,
            None => diagnostics.push(bad("logging.console-level", &level.to_string())),
        }
    }
    if let Some(level) = raw.logging.file_level {
        match check_level(level) {
            Some(v) => config.file_level = v,
            None => diagnostics.push(bad("logging.file-level", &level.to_string())),
        }
    }

    apply_colors(
        &mut config.print.colors,
        raw.print.colors,
        |k| DEFAULT_COLORS.contains_key(k),
        "print",
        diagnostics,
    );
    apply_colors(
        &mut config.print.hints,
        raw.print.hints,
        |k| DEFAULT_HINT_COLORS.contains_key(k),
        "print.hints",
        diagnostics,
    );
    apply_colors(
        &mut config.print.quotes,
        raw.print.quotes,
        |k| DEFAULT_QUOTE_COLORS.contains_key(k),
        "print.quotes",
        diagnostics,
    );
    apply_colors(
        &mut config.print.progress.colors,
        raw.print.progress.colors,
        |k| DEFAULT_PROGRESS_COLORS.contains_key(k),
        "print.progress",
        diagnostics,
    );

    if let Some(len) = raw.print.progress.bartext_len {
        if (5..=50).contains(&len) {
            config.print.progress.bartext_len = len as usize;
        } else {
            diagnostics.push(bad("print.progress.bartext-len", &len.to_string()));
        }
    }

    let pct = raw.print.progress.percentage;
    for (key, value, slot) in [
        (
            "print.progress.percentage.start-saturation",
            pct.start_saturation,
            &mut config.print.progress.start_saturation,
        ),
        (
            "print.progress.percentage.end-saturation",
            pct.end_saturation,
            &mut config.print.progress.end_saturation,
        ),
        (
            "print.progress.percentage.start-lightness",
            pct.start_lightness,
            &mut config.print.progress.start_lightness,
        ),
        (
            "print.progress.percentage.end-lightness",
            pct.end_lightness,
            &mut config.print.progress.end_lightness,
        ),
    ] {
        if let Some(v) = value {
            if (0.0..1.0).contains(&v) {
                *slot = v;
            } else {
                diagnostics.push(bad(key, &v.to_string()));
            }
        }
    }

    apply_palette(
        raw.print.ids,
        "print.ids",
        &mut config.print.ids.saturation,
        &mut config.print.ids.lightness,
        &mut config.print.ids.start_hue,
        &mut config.print.ids.end_hue,
        diagnostics,
    );
    apply_palette(
        raw.print.priority,
        "print.priority",
        &mut config.print.priority.saturation,
        &mut config.print.priority.lightness,
        &mut config.print.priority.start_hue,
        &mut config.print.priority.end_hue,
        diagnostics,
    );
}

#[allow(clippy::too_many_arguments)]
fn apply_palette(
    raw: RawPalette,
    section: &str,
    saturation: &mut f64,
    lightness: &mut f64,
    start_hue: &mut f64,
    end_hue: &mut f64,
    diagnostics: &mut Vec<String>,
) {
    for (key, value, slot, is_hue) in [
        ("saturation", raw.saturation, saturation, false),
        ("lightness", raw.lightness, lightness, false),
        ("start-hue", raw.start_hue, start_hue, true),
        ("end-hue", raw.end_hue, end_hue, true),
    ] {
        if let Some(v) = value {
            let ok = if is_hue {
                (0.0..=360.0).contains(&v)
            } else {
                (0.0..1.0).contains(&v)
            };
            if ok {
                *slot = v;
            } else {
                diagnostics.push(bad(&format!("{}.{}", section, key), &v.to_string()));
            }
        }
    }
}

fn apply_colors(
    target: &mut HashMap<String, String>,
    raw: HashMap<String, serde_yaml::Value>,
    known: impl Fn(&str) -> bool,
    section: &str,
    diagnostics: &mut Vec<String>,
) {
    for (key, value) in raw {
        if !known(&key) {
            diagnostics.push(format!("unknown key {}.{}", section, key));
            continue;
        }
        match value.as_str() {
            Some(hex) if is_hex_color(hex) => {
                target.insert(key, hex.to_string());
            }
            Some(other) => diagnostics.push(bad(&format!("{}.{}", section, key), other)),
            None => diagnostics.push(bad(&format!("{}.{}", section, key), "non-string")),
        }
    }
}

fn check_level(level: i64) -> Option<i32> {
    if (-1..=5).contains(&level) {
        Some(level as i32)
    } else {
        None
    }
}

fn bad(key: &str, value: &str) -> String {
    format!("{} out of range: {}", key, value)
}
