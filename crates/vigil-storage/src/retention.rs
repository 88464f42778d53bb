//! Age-based cleanup of history, resolved violations, and check rows.
//!
//! Active violations are never purged, whatever their age.

use rusqlite::{params, Connection};
use serde::Serialize;
use vigil_core::errors::StorageError;

use crate::connection::writer::with_immediate_transaction;

/// Report of what was cleaned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionReport {
    pub total_deleted: u64,
    pub per_table: Vec<TableCleanup>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableCleanup {
    pub table: String,
    pub deleted: u64,
}

impl RetentionReport {
    /// Rows deleted from `table`, zero if it was not touched.
    pub fn deleted_from(&self, table: &str) -> u64 {
        self.per_table
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.deleted)
            .unwrap_or(0)
    }
}

/// Delete rows older than `max_age_days` relative to `now`, in one transaction.
pub fn cleanup_old_data(
    conn: &Connection,
    max_age_days: u32,
    now: i64,
) -> Result<RetentionReport, StorageError> {
    let start = std::time::Instant::now();
    let cutoff = now - i64::from(max_age_days) * 86_400;

    let mut report = with_immediate_transaction(conn, |tx| {
        let mut report = RetentionReport::default();
        cleanup(
            tx,
            "violation_history",
            "DELETE FROM violation_history WHERE recorded_at < ?1",
            cutoff,
            &mut report,
        )?;
        cleanup(
            tx,
            "violations",
            "DELETE FROM violations
             WHERE status = 'resolved' AND COALESCE(resolved_at, last_seen_at) < ?1",
            cutoff,
            &mut report,
        )?;
        cleanup(
            tx,
            "rule_checks",
            "DELETE FROM rule_checks
             WHERE status != 'running' AND COALESCE(completed_at, started_at) < ?1",
            cutoff,
            &mut report,
        )?;
        Ok(report)
    })?;

    report.total_deleted = report.per_table.iter().map(|t| t.deleted).sum();
    report.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        total_deleted = report.total_deleted,
        max_age_days,
        "retention cleanup complete"
    );
    Ok(report)
}

fn cleanup(
    conn: &Connection,
    table: &str,
    sql: &str,
    cutoff: i64,
    report: &mut RetentionReport,
) -> Result<(), StorageError> {
    let deleted = conn
        .execute(sql, params![cutoff])
        .map_err(|e| StorageError::SqliteError {
            message: format!("retention {table}: {e}"),
        })? as u64;
    if deleted > 0 {
        tracing::debug!(table, deleted, "retention cleanup");
    }
    report.per_table.push(TableCleanup {
        table: table.to_string(),
        deleted,
    });
    Ok(())
}
