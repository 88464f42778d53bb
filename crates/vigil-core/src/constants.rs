//! Shared constants for the Vigil orchestrator.

/// Vigil version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project config file name, looked up in the target root.
pub const PROJECT_CONFIG_FILE: &str = "vigil.toml";

/// Default database file name, relative to the target root.
pub const DEFAULT_DB_FILE: &str = ".vigil/vigil.db";

// ---- Engines ----

/// Default per-engine timeout in milliseconds.
pub const DEFAULT_ENGINE_TIMEOUT_MS: u64 = 120_000;

/// Default engine priority.
pub const DEFAULT_ENGINE_PRIORITY: i32 = 100;

/// Maximum stdout/stderr bytes captured from an engine process (10 MiB).
pub const MAX_ENGINE_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

// ---- Orchestrator ----

/// Default number of files reported in the top-N summary.
pub const DEFAULT_TOP_FILES: usize = 10;

/// Code prefix length used by the `similar` dedup strategy.
pub const SIMILAR_CODE_PREFIX_CHARS: usize = 50;

// ---- Adaptive scheduler ----

/// Consecutive zero-violation checks before a rule backs off.
pub const DEFAULT_ZERO_THRESHOLD: u32 = 5;

/// Cycles between re-checks of a backed-off rule.
pub const DEFAULT_REDUCED_INTERVAL: u64 = 5;

// ---- Crossover ----

/// Lint engine wall-clock time above which a performance conflict is flagged.
pub const DEFAULT_SLOW_ENGINE_THRESHOLD_MS: u64 = 30_000;

// ---- Storage ----

/// Records per upsert transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Maximum accepted file path length in bytes.
pub const MAX_PATH_LEN: usize = 1024;

/// Maximum accepted code/message length in bytes.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Default history retention in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Number of recent checks included in dashboard data.
pub const DEFAULT_RECENT_CHECKS: usize = 10;

// ---- Watch mode ----

/// Interval between watch cycles in milliseconds.
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 5_000;

/// Debounce window for externally triggered cycles in milliseconds.
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 500;
