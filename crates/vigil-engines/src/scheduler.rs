//! Adaptive round-robin rule scheduler.
//!
//! Picks one rule per cycle by scanning forward from a rotating cursor. A rule
//! whose zero-streak has reached the threshold backs off and is only eligible
//! again once `reduced_interval` cycles have passed since its last check. If
//! nothing is eligible the rule at the cursor is checked anyway.

use rustc_hash::FxHashMap;
use vigil_core::config::SchedulerConfig;
use vigil_core::types::{RuleScheduleEntry, Violation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub zero_threshold: u32,
    pub reduced_interval: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            zero_threshold: config.effective_zero_threshold(),
            reduced_interval: config.effective_reduced_interval(),
        }
    }
}

/// The rule chosen for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRule {
    pub rule_id: String,
    pub cycle: u64,
    pub forced: bool,
}

pub struct AdaptiveScheduler {
    engine: String,
    entries: Vec<RuleScheduleEntry>,
    cursor: usize,
    cycle: u64,
    cache: FxHashMap<String, Vec<Violation>>,
    settings: SchedulerSettings,
}

impl AdaptiveScheduler {
    pub fn new(
        engine: impl Into<String>,
        rules: impl IntoIterator<Item = String>,
        settings: SchedulerSettings,
    ) -> Self {
        let engine = engine.into();
        let mut entries: Vec<RuleScheduleEntry> = Vec::new();
        for rule in rules {
            if !entries.iter().any(|e| e.rule_id == rule) {
                entries.push(RuleScheduleEntry::new(rule, engine.clone()));
            }
        }
        Self {
            engine,
            entries,
            cursor: 0,
            cycle: 0,
            cache: FxHashMap::default(),
            settings,
        }
    }

    /// Cycles started so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn entries(&self) -> &[RuleScheduleEntry] {
        &self.entries
    }

    pub fn entry(&self, rule_id: &str) -> Option<&RuleScheduleEntry> {
        self.entries.iter().find(|e| e.rule_id == rule_id)
    }

    fn is_eligible(&self, entry: &RuleScheduleEntry) -> bool {
        if !entry.enabled {
            return false;
        }
        match entry.last_checked_cycle {
            None => true,
            Some(_) if entry.zero_streak < self.settings.zero_threshold => true,
            Some(last) => self.cycle.saturating_sub(last) >= self.settings.reduced_interval,
        }
    }

    /// Start the next cycle and pick its rule. `None` when no rule is enabled.
    pub fn next_rule(&mut self) -> Option<ScheduledRule> {
        self.cycle += 1;
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        let mut forced_pick = None;
        for offset in 0..len {
            let idx = (self.cursor + offset) % len;
            let entry = &self.entries[idx];
            if !entry.enabled {
                continue;
            }
            if self.is_eligible(entry) {
                return Some(self.pick(idx, false));
            }
            if forced_pick.is_none() {
                forced_pick = Some(idx);
            }
        }

        forced_pick.map(|idx| self.pick(idx, true))
    }

    fn pick(&mut self, idx: usize, forced: bool) -> ScheduledRule {
        self.cursor = (idx + 1) % self.entries.len();
        let rule_id = self.entries[idx].rule_id.clone();
        if forced {
            tracing::debug!(engine = %self.engine, rule = %rule_id, cycle = self.cycle, "no eligible rule, forcing");
        }
        ScheduledRule {
            rule_id,
            cycle: self.cycle,
            forced,
        }
    }

    /// Record the outcome of checking `rule_id` in the current cycle.
    pub fn record(&mut self, rule_id: &str, violations: Vec<Violation>) {
        let cycle = self.cycle;
        let threshold = self.settings.zero_threshold;
        let Some(entry) = self.entries.iter_mut().find(|e| e.rule_id == rule_id) else {
            return;
        };
        entry.last_checked_cycle = Some(cycle);
        if violations.is_empty() {
            entry.zero_streak = entry.zero_streak.saturating_add(1);
            if entry.zero_streak == threshold {
                tracing::debug!(engine = %self.engine, rule = %rule_id, cycle, "rule backing off");
            }
        } else {
            entry.zero_streak = 0;
        }
        self.cache.insert(rule_id.to_string(), violations);
    }

    /// Last-known violations of every rule, in rule order.
    pub fn effective_violations(&self) -> Vec<Violation> {
        self.entries
            .iter()
            .filter_map(|e| self.cache.get(&e.rule_id))
            .flatten()
            .cloned()
            .collect()
    }

    /// Overlay persisted state onto matching rules and continue the cycle
    /// count from the latest persisted check.
    pub fn restore(&mut self, persisted: &[RuleScheduleEntry]) {
        for saved in persisted.iter().filter(|p| p.engine == self.engine) {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.rule_id == saved.rule_id) {
                entry.enabled = saved.enabled;
                entry.priority = saved.priority;
                entry.zero_streak = saved.zero_streak;
                entry.last_checked_cycle = saved.last_checked_cycle;
            }
        }
        let latest = self
            .entries
            .iter()
            .filter_map(|e| e.last_checked_cycle)
            .max()
            .unwrap_or(0);
        self.cycle = self.cycle.max(latest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::types::{Severity, ViolationSource};

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            zero_threshold: 5,
            reduced_interval: 5,
        }
    }

    fn hit(rule: &str) -> Vec<Violation> {
        vec![Violation::new("a.ts", 1, "x", Severity::Warn, ViolationSource::LintAnalyzer).with_rule(rule)]
    }

    #[test]
    fn silent_rule_backs_off_and_returns() {
        let mut sched = AdaptiveScheduler::new("eslint", ["quiet".to_string(), "noisy".to_string()], settings());
        let mut quiet_cycles = Vec::new();

        for _ in 0..14 {
            let pick = sched.next_rule().unwrap();
            assert!(!pick.forced);
            if pick.rule_id == "quiet" {
                quiet_cycles.push(pick.cycle);
                sched.record("quiet", Vec::new());
            } else {
                sched.record("noisy", hit("noisy"));
            }
        }

        // Five zero checks, skipped for cycles 10..=13, checked again on 14.
        assert_eq!(quiet_cycles, vec![1, 3, 5, 7, 9, 14]);
    }

    #[test]
    fn a_hit_resets_the_streak() {
        let mut sched = AdaptiveScheduler::new("eslint", ["only".to_string()], settings());
        for _ in 0..3 {
            sched.next_rule();
            sched.record("only", Vec::new());
        }
        assert_eq!(sched.entry("only").unwrap().zero_streak, 3);

        sched.next_rule();
        sched.record("only", hit("only"));
        assert_eq!(sched.entry("only").unwrap().zero_streak, 0);
    }

    #[test]
    fn forced_pick_when_nothing_is_eligible() {
        let mut sched = AdaptiveScheduler::new("eslint", ["a".to_string()], settings());
        for _ in 0..5 {
            sched.next_rule();
            sched.record("a", Vec::new());
        }
        let pick = sched.next_rule().unwrap();
        assert_eq!(pick.rule_id, "a");
        assert!(pick.forced);
    }

    #[test]
    fn effective_result_is_union_of_cache() {
        let mut sched = AdaptiveScheduler::new("eslint", ["a".to_string(), "b".to_string()], settings());
        let first = sched.next_rule().unwrap();
        sched.record(&first.rule_id, hit("a"));
        let second = sched.next_rule().unwrap();
        sched.record(&second.rule_id, hit("b"));

        let all = sched.effective_violations();
        assert_eq!(all.len(), 2);

        // Re-checking `a` with no hits replaces only its cached slice.
        let third = sched.next_rule().unwrap();
        assert_eq!(third.rule_id, "a");
        sched.record("a", Vec::new());
        let all = sched.effective_violations();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rule.as_deref(), Some("b"));
    }

    #[test]
    fn disabled_rules_are_never_picked() {
        let mut sched = AdaptiveScheduler::new("eslint", ["a".to_string()], settings());
        let mut disabled = RuleScheduleEntry::new("a", "eslint");
        disabled.enabled = false;
        sched.restore(&[disabled]);
        assert_eq!(sched.next_rule(), None);
    }

    #[test]
    fn restore_continues_cycle_count() {
        let mut sched = AdaptiveScheduler::new("eslint", ["a".to_string(), "b".to_string()], settings());
        let mut saved = RuleScheduleEntry::new("a", "eslint");
        saved.zero_streak = 5;
        saved.last_checked_cycle = Some(40);
        let foreign = RuleScheduleEntry::new("b", "other-engine");
        sched.restore(&[saved, foreign]);

        assert_eq!(sched.cycle(), 40);
        // `a` is backed off at cycle 41, so `b` goes first.
        assert_eq!(sched.next_rule().unwrap().rule_id, "b");
    }
}
