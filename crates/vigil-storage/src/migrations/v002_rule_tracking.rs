//! V002: rule check log and persisted scheduler state.

pub const MIGRATION_SQL: &str = r#"
-- One row per check: a whole cycle (rule_id '*') or a single scheduled rule.
CREATE TABLE IF NOT EXISTS rule_checks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_id TEXT NOT NULL,
    engine TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'running'
        CHECK (status IN ('running', 'completed', 'failed')),
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    violations_found INTEGER NOT NULL DEFAULT 0,
    execution_time_ms INTEGER NOT NULL DEFAULT 0
) STRICT;

CREATE INDEX IF NOT EXISTS idx_rule_checks_started ON rule_checks(started_at);
CREATE INDEX IF NOT EXISTS idx_rule_checks_rule ON rule_checks(rule_id, engine);

-- Updated on every scheduling decision, never deleted.
CREATE TABLE IF NOT EXISTS rule_schedules (
    rule_id TEXT NOT NULL,
    engine TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    priority INTEGER NOT NULL DEFAULT 0,
    zero_streak INTEGER NOT NULL DEFAULT 0,
    last_checked_cycle INTEGER,
    PRIMARY KEY (rule_id, engine)
) STRICT;
"#;
