use std::fs;

use tempfile::TempDir;

use crate::color::ColorMode;
use crate::config::{parse_args, Config};
use crate::store::Paths;

fn load_with(yaml: &str, extra_args: &[&str]) -> (Config, Vec<String>) {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    fs::create_dir_all(temp.path()).unwrap();
    fs::write(paths.config_file(), yaml).unwrap();

    let mut args = vec!["dotxt".to_string(), "print".to_string()];
    args.extend(extra_args.iter().map(|s| s.to_string()));
    let cli = parse_args(args).unwrap();
    Config::load(&paths, &cli).unwrap()
}

#[test]
fn test_defaults_without_file() {
    let temp = TempDir::new().unwrap();
    let paths = Paths::new(temp.path());
    let cli = parse_args(vec!["dotxt".to_string(), "print".to_string()]).unwrap();
    let (config, diags) = Config::load(&paths, &cli).unwrap();
    assert!(diags.is_empty());
    assert_eq!(config.console_level, 1);
    assert_eq!(config.print.progress.bartext_len, 20);
    assert_eq!(config.color_mode, ColorMode::Plain);
}

#[test]
fn test_file_values_applied() {
    let (config, diags) = load_with(
        "logging:\n  console-level: 3\n  file-level: -1\nprint:\n  burnt: \"#112233\"\n  hints:\n    \"+\": \"#445566\"\n",
        &[],
    );
    assert!(diags.is_empty(), "{:?}", diags);
    assert_eq!(config.console_level, 3);
    assert_eq!(config.file_level, -1);
    assert_eq!(config.print.color("burnt"), "#112233");
    assert_eq!(config.print.hint_color("+"), "#445566");
    // Untouched keys keep defaults.
    assert_eq!(config.print.color("date-due"), "#87d787");
}

#[test]
fn test_out_of_range_level_diagnosed_not_fatal() {
    let (config, diags) = load_with("logging:\n  console-level: 9\n", &[]);
    assert_eq!(diags.len(), 1);
    assert!(diags[0].contains("console-level"));
    assert_eq!(config.console_level, 1);
}

#[test]
fn test_bad_hex_diagnosed_per_key() {
    let (config, diags) = load_with(
        "print:\n  burnt: \"red\"\n  every: \"#12345\"\n",
        &[],
    );
    assert_eq!(diags.len(), 2);
    assert_eq!(config.print.color("burnt"), "#af5f00");
}

#[test]
fn test_bartext_len_range() {
    let (config, diags) = load_with("print:\n  progress:\n    bartext-len: 3\n", &[]);
    assert_eq!(diags.len(), 1);
    assert_eq!(config.print.progress.bartext_len, 20);

    let (config, diags) = load_with("print:\n  progress:\n    bartext-len: 30\n", &[]);
    assert!(diags.is_empty());
    assert_eq!(config.print.progress.bartext_len, 30);
}

#[test]
fn test_palette_ranges() {
    let (config, diags) = load_with(
        "print:\n  ids:\n    saturation: 1.5\n    start-hue: 90\n",
        &[],
    );
    assert_eq!(diags.len(), 1);
    assert!(diags[0].contains("saturation"));
    assert_eq!(config.print.ids.start_hue, 90.0);
}

#[test]
fn test_percentage_range() {
    let (config, diags) = load_with(
        "print:\n  progress:\n    percentage:\n      start-saturation: 1.0\n      end-lightness: 0.8\n",
        &[],
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(config.print.progress.end_lightness, 0.8);
}

#[test]
fn test_unparseable_file_single_diagnostic() {
    let (config, diags) = load_with(": : :\n", &[]);
    assert_eq!(diags.len(), 1);
    assert_eq!(config.console_level, 1);
}

#[test]
fn test_cli_flags_override() {
    let (config, _) = load_with("logging:\n  console-level: 0\n", &["--debug", "--color"]);
    assert!(config.debug);
    assert_eq!(config.console_level, 4);
    assert_eq!(config.color_mode, ColorMode::Ansi);
}

#[test]
fn test_conky_beats_color() {
    let (config, _) = load_with("", &["--color", "--conky"]);
    assert_eq!(config.color_mode, ColorMode::Conky);
}

#[test]
fn test_unknown_color_key_diagnosed() {
    let (_config, diags) = load_with("print:\n  sparkle: \"#123456\"\n", &[]);
    assert_eq!(diags.len(), 1);
    assert!(diags[0].contains("sparkle"));
}
