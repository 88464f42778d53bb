//! V001: violations and their append-only delta history.

pub const MIGRATION_SQL: &str = r#"
-- One row per fingerprint. Never deleted while active.
CREATE TABLE IF NOT EXISTS violations (
    fingerprint TEXT PRIMARY KEY,
    file TEXT NOT NULL,
    line INTEGER NOT NULL,
    column_num INTEGER,
    code TEXT NOT NULL,
    message TEXT,
    category TEXT NOT NULL,
    severity TEXT NOT NULL,
    source TEXT NOT NULL,
    rule TEXT,
    fix_suggestion TEXT,
    first_seen_at INTEGER NOT NULL,
    last_seen_at INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'resolved')),
    resolved_at INTEGER
) STRICT;

CREATE INDEX IF NOT EXISTS idx_violations_status ON violations(status);
CREATE INDEX IF NOT EXISTS idx_violations_file ON violations(file);
CREATE INDEX IF NOT EXISTS idx_violations_resolved_at
    ON violations(resolved_at) WHERE status = 'resolved';

-- Immutable: rows are inserted once per check and never updated.
CREATE TABLE IF NOT EXISTS violation_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    check_id INTEGER NOT NULL,
    fingerprint TEXT NOT NULL,
    action TEXT NOT NULL CHECK (action IN ('added', 'removed', 'unchanged')),
    recorded_at INTEGER NOT NULL,
    UNIQUE (check_id, fingerprint)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_history_check ON violation_history(check_id);
CREATE INDEX IF NOT EXISTS idx_history_recorded ON violation_history(recorded_at);
"#;
