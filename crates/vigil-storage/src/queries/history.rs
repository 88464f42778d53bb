//! Queries for violation_history: append-only per-check deltas.

use std::collections::BTreeSet;
use std::fmt;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use vigil_core::errors::StorageError;

use crate::connection::writer::with_immediate_transaction;

/// What happened to a fingerprint between two consecutive checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaAction {
    Added,
    Removed,
    Unchanged,
}

impl DeltaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for DeltaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts written by one `record_violation_deltas` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeltaSummary {
    pub check_id: i64,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    /// Fingerprints present in the previous check and absent now.
    pub removed_fingerprints: Vec<String>,
}

/// Per-check delta counts, for the dashboard and history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDelta {
    pub check_id: i64,
    pub recorded_at: i64,
    pub added: i64,
    pub removed: i64,
    pub unchanged: i64,
}

/// Per-day delta counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Unix timestamp of the day start (UTC).
    pub day: i64,
    pub added: i64,
    pub removed: i64,
}

/// Diff `current` against the present set of the latest earlier check and
/// append one history row per fingerprint.
///
/// The present set of a check is its `added` plus `unchanged` rows. With no
/// earlier check every fingerprint is `added`.
pub fn record_violation_deltas(
    conn: &Connection,
    check_id: i64,
    current: &[String],
    now: i64,
) -> Result<DeltaSummary, StorageError> {
    let current: BTreeSet<&str> = current.iter().map(String::as_str).collect();

    with_immediate_transaction(conn, |tx| {
        let previous = previous_present_set(tx, check_id)?;
        let mut summary = DeltaSummary {
            check_id,
            ..Default::default()
        };

        let mut insert = tx
            .prepare_cached(
                "INSERT INTO violation_history (check_id, fingerprint, action, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

        for fp in &current {
            let action = if previous.contains(*fp) {
                summary.unchanged += 1;
                DeltaAction::Unchanged
            } else {
                summary.added += 1;
                DeltaAction::Added
            };
            insert
                .execute(params![check_id, fp, action.as_str(), now])
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        }

        for fp in previous.iter().filter(|fp| !current.contains(fp.as_str())) {
            insert
                .execute(params![check_id, fp, DeltaAction::Removed.as_str(), now])
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
            summary.removed += 1;
            summary.removed_fingerprints.push(fp.clone());
        }

        Ok(summary)
    })
}

fn previous_present_set(conn: &Connection, check_id: i64) -> Result<BTreeSet<String>, StorageError> {
    let previous_check: Option<i64> = conn
        .query_row(
            "SELECT MAX(check_id) FROM violation_history WHERE check_id < ?1",
            params![check_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?
        .flatten();

    let Some(previous_check) = previous_check else {
        return Ok(BTreeSet::new());
    };

    let mut stmt = conn
        .prepare_cached(
            "SELECT fingerprint FROM violation_history
             WHERE check_id = ?1 AND action IN ('added', 'unchanged')",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![previous_check], |row| row.get::<_, String>(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<BTreeSet<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// History rows of one check as `(fingerprint, action)` pairs.
pub fn query_check(conn: &Connection, check_id: i64) -> Result<Vec<(String, String)>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT fingerprint, action FROM violation_history
             WHERE check_id = ?1 ORDER BY id",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![check_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Most recent checks first, with per-action counts.
pub fn recent_checks(conn: &Connection, limit: usize) -> Result<Vec<CheckDelta>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT check_id, MAX(recorded_at),
                    SUM(action = 'added'), SUM(action = 'removed'), SUM(action = 'unchanged')
             FROM violation_history
             GROUP BY check_id
             ORDER BY check_id DESC
             LIMIT ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(CheckDelta {
                check_id: row.get(0)?,
                recorded_at: row.get(1)?,
                added: row.get(2)?,
                removed: row.get(3)?,
                unchanged: row.get(4)?,
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Added/removed counts per UTC day over the last `days` days, oldest first.
pub fn violation_trends(
    conn: &Connection,
    days: u32,
    now: i64,
) -> Result<Vec<TrendPoint>, StorageError> {
    let cutoff = now - i64::from(days) * 86_400;
    let mut stmt = conn
        .prepare_cached(
            "SELECT (recorded_at / 86400) * 86400 AS day,
                    SUM(action = 'added'), SUM(action = 'removed')
             FROM violation_history
             WHERE recorded_at >= ?1
             GROUP BY day
             ORDER BY day ASC",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![cutoff], |row| {
            Ok(TrendPoint {
                day: row.get(0)?,
                added: row.get(1)?,
                removed: row.get(2)?,
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
