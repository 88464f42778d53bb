//! # vigil-storage
//!
//! SQLite persistence layer for Vigil.
//! Single serialized writer + round-robin read pool, `PRAGMA user_version`
//! migrations, chunked fingerprint-keyed upserts, append-only delta history,
//! dashboard aggregates, and retention.

pub mod connection;
pub mod dashboard;
pub mod migrations;
pub mod queries;
pub mod retention;
pub mod store;
pub mod validation;

pub use connection::DatabaseManager;
pub use dashboard::DashboardData;
pub use queries::history::{CheckDelta, DeltaAction, DeltaSummary, TrendPoint};
pub use queries::rule_checks::{CheckStatus, RuleCheckRow};
pub use queries::violations::{StoreOutcome, ViolationRecord, ViolationStatus};
pub use retention::RetentionReport;
pub use store::ViolationStore;

/// Current unix time in seconds.
pub(crate) fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
