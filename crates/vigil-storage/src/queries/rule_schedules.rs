//! Queries for rule_schedules: persisted adaptive scheduler state.

use rusqlite::{params, Connection};
use vigil_core::errors::StorageError;
use vigil_core::types::RuleScheduleEntry;

use crate::connection::writer::with_immediate_transaction;

/// Upsert every entry in one transaction.
pub fn upsert_schedules(
    conn: &Connection,
    entries: &[RuleScheduleEntry],
) -> Result<usize, StorageError> {
    if entries.is_empty() {
        return Ok(0);
    }
    with_immediate_transaction(conn, |tx| {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO rule_schedules
                    (rule_id, engine, enabled, priority, zero_streak, last_checked_cycle)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(rule_id, engine) DO UPDATE SET
                    enabled = excluded.enabled,
                    priority = excluded.priority,
                    zero_streak = excluded.zero_streak,
                    last_checked_cycle = excluded.last_checked_cycle",
            )
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        for entry in entries {
            stmt.execute(params![
                entry.rule_id,
                entry.engine,
                entry.enabled,
                entry.priority,
                entry.zero_streak,
                entry.last_checked_cycle.map(|c| c as i64),
            ])
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        }
        Ok(entries.len())
    })
}

/// All schedule entries owned by `engine`, ordered by rule id.
pub fn load_schedules(
    conn: &Connection,
    engine: &str,
) -> Result<Vec<RuleScheduleEntry>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT rule_id, engine, enabled, priority, zero_streak, last_checked_cycle
             FROM rule_schedules WHERE engine = ?1 ORDER BY rule_id",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![engine], |row| {
            let last: Option<i64> = row.get(5)?;
            Ok(RuleScheduleEntry {
                rule_id: row.get(0)?,
                engine: row.get(1)?,
                enabled: row.get(2)?,
                priority: row.get(3)?,
                zero_streak: row.get(4)?,
                last_checked_cycle: last.map(|c| c.max(0) as u64),
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
