//! Queries for the violations table: fingerprint-keyed upsert and resolve.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use vigil_core::errors::StorageError;
use vigil_core::types::{fingerprint, Category, Severity, Violation, ViolationSource};

use crate::connection::writer::with_immediate_transaction;
use crate::validation::validate_violation;

/// Lifecycle status of a persisted violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationStatus {
    Active,
    Resolved,
}

impl ViolationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ViolationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown violation status '{other}'")),
        }
    }
}

/// A persisted violation row.
#[derive(Debug, Clone, Serialize)]
pub struct ViolationRecord {
    pub fingerprint: String,
    pub violation: Violation,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
    pub status: ViolationStatus,
    pub resolved_at: Option<i64>,
}

/// Result of one `store_violations` call. Partial success is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// Records whose fingerprint already appeared earlier in the same batch.
    pub duplicates: usize,
    /// One entry per rejected record.
    pub errors: Vec<String>,
    /// Fingerprints of every accepted record, in batch order, without repeats.
    pub fingerprints: Vec<String>,
}

/// Validate, fingerprint, and upsert a batch in chunks of `batch_size`.
///
/// Each chunk runs in its own immediate transaction. A storage error aborts
/// the call; chunks committed before it stay committed.
pub fn store_violations(
    conn: &Connection,
    batch: &[Violation],
    batch_size: usize,
    now: i64,
) -> Result<StoreOutcome, StorageError> {
    let mut outcome = StoreOutcome::default();
    let mut seen = HashSet::with_capacity(batch.len());
    let mut accepted: Vec<(String, &Violation)> = Vec::with_capacity(batch.len());

    for (idx, v) in batch.iter().enumerate() {
        if let Err(e) = validate_violation(v) {
            outcome
                .errors
                .push(format!("record {idx} ({}): {e}", v.location()));
            continue;
        }
        let fp = fingerprint(v);
        if !seen.insert(fp.clone()) {
            outcome.duplicates += 1;
            continue;
        }
        accepted.push((fp, v));
    }

    for chunk in accepted.chunks(batch_size.max(1)) {
        let (inserted, updated) = with_immediate_transaction(conn, |tx| upsert_chunk(tx, chunk, now))?;
        outcome.inserted += inserted;
        outcome.updated += updated;
    }

    outcome.fingerprints = accepted.into_iter().map(|(fp, _)| fp).collect();
    Ok(outcome)
}

fn upsert_chunk(
    conn: &Connection,
    chunk: &[(String, &Violation)],
    now: i64,
) -> Result<(usize, usize), StorageError> {
    let mut insert = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO violations
                (fingerprint, file, line, column_num, code, message, category, severity,
                 source, rule, fix_suggestion, first_seen_at, last_seen_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12, 'active')",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let mut refresh = conn
        .prepare_cached(
            "UPDATE violations
             SET last_seen_at = ?2, status = 'active', resolved_at = NULL,
                 column_num = ?3, fix_suggestion = ?4
             WHERE fingerprint = ?1",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut inserted = 0;
    let mut updated = 0;
    for (fp, v) in chunk {
        let changed = insert
            .execute(params![
                fp,
                v.file,
                v.line,
                v.column,
                v.code,
                v.message,
                v.category.as_str(),
                v.severity.as_str(),
                v.source.as_str(),
                v.rule,
                v.fix_suggestion,
                now,
            ])
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        if changed > 0 {
            inserted += 1;
            continue;
        }
        // Fingerprint already stored: refresh and reactivate.
        refresh
            .execute(params![fp, now, v.column, v.fix_suggestion])
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        updated += 1;
    }
    Ok((inserted, updated))
}

/// Mark active fingerprints resolved. Returns how many rows actually changed;
/// unknown or already-resolved fingerprints are ignored.
pub fn resolve_violations(
    conn: &Connection,
    fingerprints: &[String],
    now: i64,
) -> Result<usize, StorageError> {
    if fingerprints.is_empty() {
        return Ok(0);
    }
    with_immediate_transaction(conn, |tx| {
        let mut stmt = tx
            .prepare_cached(
                "UPDATE violations SET status = 'resolved', resolved_at = ?2
                 WHERE fingerprint = ?1 AND status = 'active'",
            )
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        let mut changed = 0;
        for fp in fingerprints {
            changed += stmt
                .execute(params![fp, now])
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        }
        Ok(changed)
    })
}

const SELECT_COLUMNS: &str = "fingerprint, file, line, column_num, code, message, category,
     severity, source, rule, fix_suggestion, first_seen_at, last_seen_at, status, resolved_at";

/// Look up one violation by fingerprint.
pub fn get_violation(
    conn: &Connection,
    fingerprint: &str,
) -> Result<Option<ViolationRecord>, StorageError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM violations WHERE fingerprint = ?1");
    conn.prepare_cached(&sql)
        .and_then(|mut stmt| stmt.query_row(params![fingerprint], map_record).optional())
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Active violations ordered by file and line.
pub fn query_active(conn: &Connection) -> Result<Vec<ViolationRecord>, StorageError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM violations WHERE status = 'active' ORDER BY file, line"
    );
    let mut stmt = conn
        .prepare_cached(&sql)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map([], map_record)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Count violations with the given status.
pub fn count_by_status(conn: &Connection, status: ViolationStatus) -> Result<i64, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM violations WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

fn parse_column<T: FromStr<Err = String>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::from(e))
    })
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<ViolationRecord> {
    let violation = Violation {
        file: row.get(1)?,
        line: row.get(2)?,
        column: row.get(3)?,
        code: row.get(4)?,
        message: row.get(5)?,
        category: parse_column::<Category>(row, 6)?,
        severity: parse_column::<Severity>(row, 7)?,
        source: parse_column::<ViolationSource>(row, 8)?,
        rule: row.get(9)?,
        fix_suggestion: row.get(10)?,
    };
    Ok(ViolationRecord {
        fingerprint: row.get(0)?,
        violation,
        first_seen_at: row.get(11)?,
        last_seen_at: row.get(12)?,
        status: parse_column::<ViolationStatus>(row, 13)?,
        resolved_at: row.get(14)?,
    })
}
