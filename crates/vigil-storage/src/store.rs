//! ViolationStore: the explicitly constructed handle that owns the database.
//!
//! All persistence goes through here; callers hold it by value or `Arc` and
//! pass it down. Methods are blocking and meant for `spawn_blocking` from
//! async code.

use std::path::Path;

use vigil_core::constants;
use vigil_core::errors::StorageError;
use vigil_core::types::{RuleScheduleEntry, Violation};

use crate::connection::DatabaseManager;
use crate::dashboard::{self, DashboardData};
use crate::now_secs;
use crate::queries::history::{self, CheckDelta, DeltaSummary, TrendPoint};
use crate::queries::rule_checks::{self, CheckStatus, RuleCheckRow};
use crate::queries::{rule_schedules, violations};
use crate::queries::violations::{StoreOutcome, ViolationRecord};
use crate::retention::{self, RetentionReport};

pub struct ViolationStore {
    db: DatabaseManager,
    batch_size: usize,
}

impl ViolationStore {
    /// Open (or create) a file-backed store.
    pub fn open(path: &Path, batch_size: usize) -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open(path)?,
            batch_size: batch_size.max(1),
        })
    }

    /// Open an in-memory store.
    pub fn open_in_memory(batch_size: usize) -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
            batch_size: batch_size.max(1),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    // ---- Violations ----

    /// Validate and upsert a batch. Rejected records land in `errors`.
    pub fn store_violations(&self, batch: &[Violation]) -> Result<StoreOutcome, StorageError> {
        let now = now_secs();
        let outcome = self
            .db
            .with_writer(|conn| violations::store_violations(conn, batch, self.batch_size, now))?;
        tracing::debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            rejected = outcome.errors.len(),
            "stored violations"
        );
        Ok(outcome)
    }

    /// Resolve active fingerprints; returns the number actually changed.
    pub fn resolve_violations(&self, fingerprints: &[String]) -> Result<usize, StorageError> {
        let now = now_secs();
        self.db
            .with_writer(|conn| violations::resolve_violations(conn, fingerprints, now))
    }

    pub fn get_violation(&self, fingerprint: &str) -> Result<Option<ViolationRecord>, StorageError> {
        self.db
            .with_reader(|conn| violations::get_violation(conn, fingerprint))
    }

    pub fn active_violations(&self) -> Result<Vec<ViolationRecord>, StorageError> {
        self.db.with_reader(violations::query_active)
    }

    // ---- History ----

    /// Append added/removed/unchanged rows for `check_id`.
    pub fn record_violation_deltas(
        &self,
        check_id: i64,
        current: &[String],
    ) -> Result<DeltaSummary, StorageError> {
        let now = now_secs();
        let summary = self
            .db
            .with_writer(|conn| history::record_violation_deltas(conn, check_id, current, now))?;
        tracing::debug!(
            check_id,
            added = summary.added,
            removed = summary.removed,
            unchanged = summary.unchanged,
            "recorded deltas"
        );
        Ok(summary)
    }

    pub fn recent_checks(&self, limit: usize) -> Result<Vec<CheckDelta>, StorageError> {
        self.db.with_reader(|conn| history::recent_checks(conn, limit))
    }

    pub fn violation_trends(&self, days: u32) -> Result<Vec<TrendPoint>, StorageError> {
        let now = now_secs();
        self.db
            .with_reader(|conn| history::violation_trends(conn, days, now))
    }

    // ---- Rule checks ----

    /// Open a `running` check row; the id doubles as the delta check id.
    pub fn begin_check(&self, rule_id: &str, engine: &str) -> Result<i64, StorageError> {
        let now = now_secs();
        self.db
            .with_writer(|conn| rule_checks::insert_check_start(conn, rule_id, engine, now))
    }

    pub fn complete_check(
        &self,
        id: i64,
        status: CheckStatus,
        violations_found: usize,
        execution_time_ms: u64,
    ) -> Result<(), StorageError> {
        let now = now_secs();
        self.db.with_writer(|conn| {
            rule_checks::update_check_complete(
                conn,
                id,
                status,
                now,
                violations_found as i64,
                execution_time_ms as i64,
            )
        })
    }

    /// Log a finished per-rule check.
    pub fn record_rule_check(
        &self,
        rule_id: &str,
        engine: &str,
        violations_found: usize,
        execution_time_ms: u64,
    ) -> Result<i64, StorageError> {
        let now = now_secs();
        self.db.with_writer(|conn| {
            rule_checks::insert_completed_check(
                conn,
                rule_id,
                engine,
                now,
                violations_found as i64,
                execution_time_ms as i64,
            )
        })
    }

    pub fn recent_rule_checks(&self, limit: usize) -> Result<Vec<RuleCheckRow>, StorageError> {
        self.db
            .with_reader(|conn| rule_checks::query_recent(conn, limit))
    }

    // ---- Schedules ----

    pub fn save_schedules(&self, entries: &[RuleScheduleEntry]) -> Result<usize, StorageError> {
        self.db
            .with_writer(|conn| rule_schedules::upsert_schedules(conn, entries))
    }

    pub fn load_schedules(&self, engine: &str) -> Result<Vec<RuleScheduleEntry>, StorageError> {
        self.db
            .with_reader(|conn| rule_schedules::load_schedules(conn, engine))
    }

    // ---- Aggregates & maintenance ----

    /// Dashboard aggregates; zeroed on an empty database.
    pub fn get_dashboard_data(&self, top_files: usize) -> Result<DashboardData, StorageError> {
        self.db.with_reader(|conn| {
            dashboard::get_dashboard_data(conn, top_files, constants::DEFAULT_RECENT_CHECKS)
        })
    }

    /// Purge history, resolved violations, and finished checks older than
    /// `max_age_days`.
    pub fn cleanup_old_data(&self, max_age_days: u32) -> Result<RetentionReport, StorageError> {
        let now = now_secs();
        let report = self
            .db
            .with_writer(|conn| retention::cleanup_old_data(conn, max_age_days, now))?;
        self.db.checkpoint()?;
        Ok(report)
    }
}
