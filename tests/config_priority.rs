//! Config priority contract tests.
//!
//! These tests verify that CLI options take priority over config file settings.
//! Priority order (highest to lowest):
//! 1. CLI arguments
//! 2. Config file values
//! 3. Built-in defaults

use chatgpt_md_translator::config::{
    ConfigFile, DEFAULT_FRAGMENT_SIZE, OverwritePolicy, ResolveOptions, resolve_config,
};
use std::path::PathBuf;

fn make_config_file() -> ConfigFile {
    ConfigFile::from_iter([
        ("OPENAI_API_KEY", "sk-test"),
        ("MODEL_NAME", "4"),
        ("TEMPERATURE", "0.3"),
        ("FRAGMENT_TOKEN_SIZE", "1024"),
        ("API_CALL_INTERVAL", "2"),
        ("OVERWRITE_POLICY", "abort"),
    ])
}

#[test]
fn test_cli_model_overrides_config_model() {
    let options = ResolveOptions {
        model: Some("3large".to_string()),
        ..ResolveOptions::default()
    };

    let resolved = resolve_config(&options, &make_config_file(), String::new()).unwrap();

    assert_eq!(resolved.config.model, "gpt-3.5-turbo-16k");
}

#[test]
fn test_config_model_used_when_cli_not_specified() {
    let resolved =
        resolve_config(&ResolveOptions::default(), &make_config_file(), String::new()).unwrap();

    assert_eq!(resolved.config.model, "gpt-4");
}

#[test]
fn test_cli_numbers_override_config_numbers() {
    let options = ResolveOptions {
        fragment_size: Some(300),
        temperature: Some(1.0),
        interval: Some(0.5),
        ..ResolveOptions::default()
    };

    let config = resolve_config(&options, &make_config_file(), String::new())
        .unwrap()
        .config;

    assert_eq!(config.fragment_size, 300);
    assert!((config.temperature - 1.0).abs() < f64::EPSILON);
    assert!((config.api_call_interval - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_config_numbers_used_when_cli_not_specified() {
    let config = resolve_config(&ResolveOptions::default(), &make_config_file(), String::new())
        .unwrap()
        .config;

    assert_eq!(config.fragment_size, 1024);
    assert!((config.temperature - 0.3).abs() < f64::EPSILON);
    assert!((config.api_call_interval - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_builtin_defaults_when_neither_specified() {
    let file = ConfigFile::from_iter([("OPENAI_API_KEY", "sk-test")]);
    let config = resolve_config(&ResolveOptions::default(), &file, String::new())
        .unwrap()
        .config;

    assert_eq!(config.model, "gpt-3.5-turbo");
    assert_eq!(config.fragment_size, DEFAULT_FRAGMENT_SIZE);
    assert_eq!(config.overwrite_policy, OverwritePolicy::Overwrite);
}

#[test]
fn test_cli_overwrite_policy_overrides_config() {
    let options = ResolveOptions {
        overwrite_policy: Some(OverwritePolicy::Skip),
        ..ResolveOptions::default()
    };

    let config = resolve_config(&options, &make_config_file(), String::new())
        .unwrap()
        .config;

    assert_eq!(config.overwrite_policy, OverwritePolicy::Skip);
}

#[test]
fn test_output_file_pattern_wins_over_out_suffix() {
    let file = ConfigFile::from_iter([
        ("OPENAI_API_KEY", "sk-test"),
        ("OUTPUT_FILE_PATTERN", "{main}-fr.{ext}"),
    ]);
    let options = ResolveOptions {
        out_suffix: Some("-ja.md".to_string()),
        ..ResolveOptions::default()
    };

    let resolved = resolve_config(&options, &file, String::new()).unwrap();

    assert_eq!(
        resolved.config.output_file_pattern.as_deref(),
        Some("{main}-fr.{ext}")
    );
    assert!(resolved.warnings.iter().any(|w| w.contains("deprecated")));
}

#[test]
fn test_cli_out_is_kept() {
    let options = ResolveOptions {
        out: Some(PathBuf::from("translated.md")),
        ..ResolveOptions::default()
    };

    let config = resolve_config(&options, &make_config_file(), String::new())
        .unwrap()
        .config;

    assert_eq!(config.out, Some(PathBuf::from("translated.md")));
}
