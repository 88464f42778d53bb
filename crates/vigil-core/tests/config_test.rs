//! Tests for the Vigil configuration system.

use std::sync::Mutex;

use vigil_core::config::{CliOverrides, VigilConfig};
use vigil_core::errors::ConfigError;
use vigil_core::types::{DedupStrategy, ViolationSource};

/// Serializes tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

fn clear_vigil_env_vars() {
    for key in VigilConfig::env_keys() {
        std::env::remove_var(key);
    }
}

#[test]
fn test_layered_resolution_cli_over_env_over_project() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_vigil_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("vigil.toml"),
        r#"
[orchestrator]
dedup_strategy = "location"

[storage]
batch_size = 50
retention_days = 7
"#,
    )
    .unwrap();

    std::env::set_var("VIGIL_BATCH_SIZE", "250");
    std::env::set_var("VIGIL_DEDUP_STRATEGY", "similar");

    let cli = CliOverrides {
        dedup_strategy: Some(DedupStrategy::Exact),
        ..Default::default()
    };
    let config = VigilConfig::load(dir.path(), Some(&cli)).unwrap();

    // CLI beats env and project
    assert_eq!(
        config.orchestrator.effective_dedup_strategy(),
        DedupStrategy::Exact
    );
    // Env beats project
    assert_eq!(config.storage.effective_batch_size(), 250);
    // Project beats defaults
    assert_eq!(config.storage.effective_retention_days(), 7);

    clear_vigil_env_vars();
}

#[test]
fn test_missing_files_fall_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_vigil_env_vars();

    let dir = tempdir();
    let config = VigilConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.orchestrator.effective_dedup_strategy(), DedupStrategy::Exact);
    assert_eq!(config.orchestrator.effective_top_files(), 10);
    assert_eq!(config.scheduler.effective_zero_threshold(), 5);
    assert_eq!(config.scheduler.effective_reduced_interval(), 5);
    assert!(!config.crossover.effective_fail_on_crossover());
    assert_eq!(config.storage.effective_batch_size(), 100);
    assert!(!config.storage.effective_auto_resolve_removed());
    assert_eq!(
        config.storage.effective_db_path(dir.path()),
        dir.path().join(".vigil/vigil.db")
    );
    assert!(config.engines.is_empty());
}

#[test]
fn test_unparseable_env_value_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_vigil_env_vars();

    let dir = tempdir();
    std::env::set_var("VIGIL_ZERO_THRESHOLD", "lots");
    let config = VigilConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.scheduler.zero_threshold, None);

    clear_vigil_env_vars();
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_vigil_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("vigil.toml"), "not [valid toml {{{").unwrap();

    match VigilConfig::load(dir.path(), None) {
        Err(ConfigError::ParseError { .. }) => {}
        other => panic!("Expected ParseError, got: {:?}", other),
    }
}

#[test]
fn test_zero_values_fail_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_vigil_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("vigil.toml"),
        r#"
[scheduler]
reduced_interval = 0
"#,
    )
    .unwrap();

    match VigilConfig::load(dir.path(), None) {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "scheduler.reduced_interval");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }
}

#[test]
fn test_empty_engine_command_fails_validation() {
    let config = VigilConfig::from_toml(
        r#"
[engines.tsc]
command = "  "
"#,
    )
    .unwrap();

    match VigilConfig::validate(&config) {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "engines.tsc.command");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }
}

#[test]
fn test_rotating_engine_without_rule_placeholder_fails_validation() {
    let config = VigilConfig::from_toml(
        r#"
[engines.eslint]
command = "eslint"
args = ["--format", "json", "{target}"]
rules = ["no-unused-vars", "prefer-const"]
"#,
    )
    .unwrap();

    match VigilConfig::validate(&config) {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "engines.eslint.args");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }

    let fixed = VigilConfig::from_toml(
        r#"
[engines.eslint]
command = "eslint"
args = ["--rule", "{rule}", "{target}"]
rules = ["no-unused-vars"]
"#,
    )
    .unwrap();
    assert!(VigilConfig::validate(&fixed).is_ok());
}

#[test]
fn test_engine_tables_parse() {
    let config = VigilConfig::from_toml(
        r#"
[engines.tsc]
command = "npx"
args = ["tsc", "--noEmit", "-p", "{target}"]
source = "type-analyzer"
priority = 1
allow_failure = false

[engines.eslint]
command = "npx"
args = ["eslint", "--rule", "{rule}", "{target}"]
source = "lint-analyzer"
rules = ["no-unused-vars", "prefer-const"]
success_exit_codes = [0, 1, 2]
"#,
    )
    .unwrap();

    let tsc = &config.engines["tsc"];
    assert_eq!(tsc.effective_source(), ViolationSource::TypeAnalyzer);
    assert_eq!(tsc.effective_priority(), 1);
    assert!(!tsc.effective_allow_failure());
    assert!(!tsc.is_rotating());
    assert_eq!(tsc.effective_success_exit_codes(), vec![0, 1]);

    let eslint = &config.engines["eslint"];
    assert!(eslint.is_rotating());
    assert!(eslint.effective_allow_failure());
    assert_eq!(eslint.effective_priority(), 100);
    assert_eq!(eslint.effective_success_exit_codes(), vec![0, 1, 2]);
}

#[test]
fn test_unrecognized_keys_accepted() {
    let config = VigilConfig::from_toml(
        r#"
[watch]
interval_ms = 1000
future_key = "hello"

[future_section]
another = 42
"#,
    );
    assert!(config.is_ok());
    assert_eq!(config.unwrap().watch.effective_interval_ms(), 1000);
}

#[test]
fn test_toml_round_trip_preserves_engines() {
    let config = VigilConfig::from_toml(
        r#"
[crossover]
fail_on_crossover = true
extra_type_aware_rules = ["my/type-rule"]

[engines.custom]
command = "./check.sh"
"#,
    )
    .unwrap();

    let rendered = config.to_toml().unwrap();
    let reparsed = VigilConfig::from_toml(&rendered).unwrap();
    assert!(reparsed.crossover.effective_fail_on_crossover());
    assert_eq!(reparsed.crossover.extra_type_aware_rules, vec!["my/type-rule"]);
    assert_eq!(reparsed.engines["custom"].command, "./check.sh");
}
