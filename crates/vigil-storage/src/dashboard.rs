//! Read-mostly aggregate for the display collaborator.

use std::collections::BTreeMap;

use rusqlite::{params, Connection};
use serde::Serialize;
use vigil_core::errors::StorageError;

use crate::queries::history::{self, CheckDelta};
use crate::queries::rule_checks::{self, RuleCheckRow};
use crate::queries::violations::{self, ViolationStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub file: String,
    pub count: i64,
}

/// Current state of the store. All aggregates are zero on an empty database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub total_active: i64,
    pub total_resolved: i64,
    pub files_affected: i64,
    pub by_severity: BTreeMap<String, i64>,
    pub by_source: BTreeMap<String, i64>,
    pub by_category: BTreeMap<String, i64>,
    pub top_files: Vec<FileCount>,
    pub recent_checks: Vec<CheckDelta>,
    pub last_check: Option<RuleCheckRow>,
}

/// Assemble dashboard data from one connection.
pub fn get_dashboard_data(
    conn: &Connection,
    top_files: usize,
    recent_checks: usize,
) -> Result<DashboardData, StorageError> {
    Ok(DashboardData {
        total_active: violations::count_by_status(conn, ViolationStatus::Active)?,
        total_resolved: violations::count_by_status(conn, ViolationStatus::Resolved)?,
        files_affected: conn
            .query_row(
                "SELECT COUNT(DISTINCT file) FROM violations WHERE status = 'active'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?,
        by_severity: active_breakdown(conn, "severity")?,
        by_source: active_breakdown(conn, "source")?,
        by_category: active_breakdown(conn, "category")?,
        top_files: query_top_files(conn, top_files)?,
        recent_checks: history::recent_checks(conn, recent_checks)?,
        last_check: rule_checks::last_completed_cycle(conn)?,
    })
}

/// `column` is one of the fixed breakdown columns, never user input.
fn active_breakdown(conn: &Connection, column: &str) -> Result<BTreeMap<String, i64>, StorageError> {
    let sql = format!(
        "SELECT {column}, COUNT(*) FROM violations WHERE status = 'active' GROUP BY {column}"
    );
    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<BTreeMap<_, _>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

fn query_top_files(conn: &Connection, limit: usize) -> Result<Vec<FileCount>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, COUNT(*) AS n FROM violations WHERE status = 'active'
             GROUP BY file ORDER BY n DESC, file ASC LIMIT ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(FileCount {
                file: row.get(0)?,
                count: row.get(1)?,
            })
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}
