//! Queries for the rule_checks table: one row per cycle or per-rule check.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use vigil_core::errors::StorageError;

/// `rule_id` / `engine` used for whole-cycle check rows.
pub const CYCLE_SCOPE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Running,
    Completed,
    Failed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown check status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleCheckRow {
    pub id: i64,
    pub rule_id: String,
    pub engine: String,
    pub status: CheckStatus,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub violations_found: i64,
    pub execution_time_ms: i64,
}

/// Insert a check row with status `running`. Returns the row id.
pub fn insert_check_start(
    conn: &Connection,
    rule_id: &str,
    engine: &str,
    started_at: i64,
) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO rule_checks (rule_id, engine, status, started_at)
         VALUES (?1, ?2, 'running', ?3)",
        params![rule_id, engine, started_at],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(conn.last_insert_rowid())
}

/// Close a check row.
pub fn update_check_complete(
    conn: &Connection,
    id: i64,
    status: CheckStatus,
    completed_at: i64,
    violations_found: i64,
    execution_time_ms: i64,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE rule_checks SET
            status = ?1, completed_at = ?2, violations_found = ?3, execution_time_ms = ?4
         WHERE id = ?5",
        params![status.as_str(), completed_at, violations_found, execution_time_ms, id],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

/// Insert an already-finished per-rule check in one statement.
pub fn insert_completed_check(
    conn: &Connection,
    rule_id: &str,
    engine: &str,
    completed_at: i64,
    violations_found: i64,
    execution_time_ms: i64,
) -> Result<i64, StorageError> {
    let started_at = completed_at - execution_time_ms / 1000;
    conn.execute(
        "INSERT INTO rule_checks
            (rule_id, engine, status, started_at, completed_at, violations_found, execution_time_ms)
         VALUES (?1, ?2, 'completed', ?3, ?4, ?5, ?6)",
        params![rule_id, engine, started_at, completed_at, violations_found, execution_time_ms],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(conn.last_insert_rowid())
}

const COLUMNS: &str = "id, rule_id, engine, status, started_at, completed_at,
     violations_found, execution_time_ms";

/// Most recent checks first.
pub fn query_recent(conn: &Connection, limit: usize) -> Result<Vec<RuleCheckRow>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM rule_checks ORDER BY id DESC LIMIT ?1");
    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![limit as i64], map_row)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// The latest completed whole-cycle check, if any.
pub fn last_completed_cycle(conn: &Connection) -> Result<Option<RuleCheckRow>, StorageError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM rule_checks
         WHERE rule_id = ?1 AND status = 'completed' ORDER BY id DESC LIMIT 1"
    );
    conn.prepare_cached(&sql)
        .and_then(|mut stmt| stmt.query_row(params![CYCLE_SCOPE], map_row).optional())
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RuleCheckRow> {
    let status: String = row.get(3)?;
    let status = status
        .parse::<CheckStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::from(e)))?;
    Ok(RuleCheckRow {
        id: row.get(0)?,
        rule_id: row.get(1)?,
        engine: row.get(2)?,
        status,
        started_at: row.get(4)?,
        completed_at: row.get(5)?,
        violations_found: row.get(6)?,
        execution_time_ms: row.get(7)?,
    })
}
