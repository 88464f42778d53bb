//! Persisted scheduling state for rotating per-rule engines.

use serde::{Deserialize, Serialize};

/// Schedule state for one rule owned by one engine.
///
/// Updated on every scheduling decision, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleScheduleEntry {
    pub rule_id: String,
    pub engine: String,
    pub enabled: bool,
    pub priority: i32,
    /// Consecutive checks that produced zero violations.
    pub zero_streak: u32,
    /// Cycle index of the last check; `None` until first checked.
    pub last_checked_cycle: Option<u64>,
}

impl RuleScheduleEntry {
    pub fn new(rule_id: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            engine: engine.into(),
            enabled: true,
            priority: 0,
            zero_streak: 0,
            last_checked_cycle: None,
        }
    }
}
