//! Top-level Vigil configuration with layered resolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    CrossoverConfig, EngineConfig, OrchestratorConfig, SchedulerConfig, StorageConfig,
    WatchConfig,
};
use crate::constants;
use crate::errors::ConfigError;
use crate::types::DedupStrategy;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI overrides (applied via `apply_cli_overrides`)
/// 2. Environment variables (`VIGIL_*`)
/// 3. Project config (`vigil.toml` in the target root)
/// 4. User config (`~/.vigil/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VigilConfig {
    pub orchestrator: OrchestratorConfig,
    pub scheduler: SchedulerConfig,
    pub crossover: CrossoverConfig,
    pub storage: StorageConfig,
    pub watch: WatchConfig,
    /// Engines keyed by name. Equal priorities fall back to name order.
    pub engines: BTreeMap<String, EngineConfig>,
}

/// Override values handed down by the command-line collaborator.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dedup_strategy: Option<DedupStrategy>,
    pub fail_on_crossover: Option<bool>,
    pub db_path: Option<String>,
    pub watch_interval_ms: Option<u64>,
}

const ENV_KEYS: &[&str] = &[
    "VIGIL_DEDUP_STRATEGY",
    "VIGIL_TOP_FILES",
    "VIGIL_ENGINE_TIMEOUT_MS",
    "VIGIL_ZERO_THRESHOLD",
    "VIGIL_REDUCED_INTERVAL",
    "VIGIL_FAIL_ON_CROSSOVER",
    "VIGIL_DB_PATH",
    "VIGIL_BATCH_SIZE",
    "VIGIL_RETENTION_DAYS",
    "VIGIL_WATCH_INTERVAL_MS",
];

impl VigilConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(constants::PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI overrides
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &VigilConfig) -> Result<(), ConfigError> {
        fn nonzero<T: PartialEq + From<u8>>(
            value: Option<T>,
            field: &str,
        ) -> Result<(), ConfigError> {
            match value {
                Some(v) if v == T::from(0) => Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be greater than 0".to_string(),
                }),
                _ => Ok(()),
            }
        }

        nonzero(config.orchestrator.top_files, "orchestrator.top_files")?;
        nonzero(
            config.orchestrator.default_timeout_ms,
            "orchestrator.default_timeout_ms",
        )?;
        nonzero(config.scheduler.zero_threshold, "scheduler.zero_threshold")?;
        nonzero(config.scheduler.reduced_interval, "scheduler.reduced_interval")?;
        nonzero(config.storage.batch_size, "storage.batch_size")?;
        nonzero(config.storage.retention_days, "storage.retention_days")?;
        nonzero(config.watch.interval_ms, "watch.interval_ms")?;

        for (name, engine) in &config.engines {
            if engine.command.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("engines.{name}.command"),
                    message: "must not be empty".to_string(),
                });
            }
            nonzero(engine.timeout_ms, &format!("engines.{name}.timeout_ms"))?;
            if engine.is_rotating() && !engine.args.iter().any(|a| a.contains("{rule}")) {
                return Err(ConfigError::ValidationFailed {
                    field: format!("engines.{name}.args"),
                    message: "an engine with `rules` needs a {rule} placeholder in its args"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.vigil/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".vigil").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut VigilConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: VigilConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it has a value.
    fn merge(base: &mut VigilConfig, other: VigilConfig) {
        // Orchestrator
        if other.orchestrator.dedup_strategy.is_some() {
            base.orchestrator.dedup_strategy = other.orchestrator.dedup_strategy;
        }
        if other.orchestrator.top_files.is_some() {
            base.orchestrator.top_files = other.orchestrator.top_files;
        }
        if other.orchestrator.default_timeout_ms.is_some() {
            base.orchestrator.default_timeout_ms = other.orchestrator.default_timeout_ms;
        }

        // Scheduler
        if other.scheduler.zero_threshold.is_some() {
            base.scheduler.zero_threshold = other.scheduler.zero_threshold;
        }
        if other.scheduler.reduced_interval.is_some() {
            base.scheduler.reduced_interval = other.scheduler.reduced_interval;
        }

        // Crossover
        if other.crossover.enabled.is_some() {
            base.crossover.enabled = other.crossover.enabled;
        }
        if other.crossover.fail_on_crossover.is_some() {
            base.crossover.fail_on_crossover = other.crossover.fail_on_crossover;
        }
        if other.crossover.slow_engine_threshold_ms.is_some() {
            base.crossover.slow_engine_threshold_ms = other.crossover.slow_engine_threshold_ms;
        }
        if !other.crossover.extra_type_aware_rules.is_empty() {
            base.crossover.extra_type_aware_rules = other.crossover.extra_type_aware_rules;
        }
        if !other.crossover.watched_engines.is_empty() {
            base.crossover.watched_engines = other.crossover.watched_engines;
        }

        // Storage
        if other.storage.db_path.is_some() {
            base.storage.db_path = other.storage.db_path;
        }
        if other.storage.batch_size.is_some() {
            base.storage.batch_size = other.storage.batch_size;
        }
        if other.storage.retention_days.is_some() {
            base.storage.retention_days = other.storage.retention_days;
        }
        if other.storage.auto_resolve_removed.is_some() {
            base.storage.auto_resolve_removed = other.storage.auto_resolve_removed;
        }

        // Watch
        if other.watch.interval_ms.is_some() {
            base.watch.interval_ms = other.watch.interval_ms;
        }
        if other.watch.debounce_ms.is_some() {
            base.watch.debounce_ms = other.watch.debounce_ms;
        }

        // Engines: a later layer replaces a same-named engine wholesale.
        base.engines.extend(other.engines);
    }

    /// Apply environment variable overrides.
    /// Pattern: `VIGIL_DEDUP_STRATEGY`, `VIGIL_BATCH_SIZE`, etc.
    fn apply_env_overrides(config: &mut VigilConfig) {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            let raw = std::env::var(key).ok()?;
            match raw.parse::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
                    None
                }
            }
        }

        if let Some(v) = parsed::<DedupStrategy>("VIGIL_DEDUP_STRATEGY") {
            config.orchestrator.dedup_strategy = Some(v);
        }
        if let Some(v) = parsed::<usize>("VIGIL_TOP_FILES") {
            config.orchestrator.top_files = Some(v);
        }
        if let Some(v) = parsed::<u64>("VIGIL_ENGINE_TIMEOUT_MS") {
            config.orchestrator.default_timeout_ms = Some(v);
        }
        if let Some(v) = parsed::<u32>("VIGIL_ZERO_THRESHOLD") {
            config.scheduler.zero_threshold = Some(v);
        }
        if let Some(v) = parsed::<u64>("VIGIL_REDUCED_INTERVAL") {
            config.scheduler.reduced_interval = Some(v);
        }
        if let Some(v) = parsed::<bool>("VIGIL_FAIL_ON_CROSSOVER") {
            config.crossover.fail_on_crossover = Some(v);
        }
        if let Ok(v) = std::env::var("VIGIL_DB_PATH") {
            config.storage.db_path = Some(v);
        }
        if let Some(v) = parsed::<usize>("VIGIL_BATCH_SIZE") {
            config.storage.batch_size = Some(v);
        }
        if let Some(v) = parsed::<u32>("VIGIL_RETENTION_DAYS") {
            config.storage.retention_days = Some(v);
        }
        if let Some(v) = parsed::<u64>("VIGIL_WATCH_INTERVAL_MS") {
            config.watch.interval_ms = Some(v);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut VigilConfig, cli: &CliOverrides) {
        if let Some(v) = cli.dedup_strategy {
            config.orchestrator.dedup_strategy = Some(v);
        }
        if let Some(v) = cli.fail_on_crossover {
            config.crossover.fail_on_crossover = Some(v);
        }
        if let Some(ref v) = cli.db_path {
            config.storage.db_path = Some(v.clone());
        }
        if let Some(v) = cli.watch_interval_ms {
            config.watch.interval_ms = Some(v);
        }
    }

    /// Environment variable names consulted by `load`.
    pub fn env_keys() -> &'static [&'static str] {
        ENV_KEYS
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
