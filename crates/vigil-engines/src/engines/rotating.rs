//! Adapter that checks one rule per cycle under the adaptive scheduler.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use vigil_core::errors::EngineError;
use vigil_core::traits::CancellationToken;
use vigil_core::types::{RuleScheduleEntry, Violation, ViolationSource};

use crate::engine::{AnalysisEngine, ExecuteOptions, RuleCheck};
use crate::scheduler::{AdaptiveScheduler, SchedulerSettings};

/// A backing tool that can run a single rule at a time.
#[async_trait]
pub trait RuleChecker: Send + Sync {
    async fn check_rule(
        &self,
        target: &Path,
        rule: &str,
        options: &ExecuteOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError>;
}

pub struct RotatingEngine<C> {
    name: String,
    source: ViolationSource,
    checker: C,
    scheduler: Mutex<AdaptiveScheduler>,
    last_check: Mutex<Option<RuleCheck>>,
}

impl<C: RuleChecker> RotatingEngine<C> {
    pub fn new(
        name: impl Into<String>,
        source: ViolationSource,
        checker: C,
        rules: Vec<String>,
        settings: SchedulerSettings,
    ) -> Self {
        let name = name.into();
        Self {
            scheduler: Mutex::new(AdaptiveScheduler::new(name.clone(), rules, settings)),
            name,
            source,
            checker,
            last_check: Mutex::new(None),
        }
    }

    fn poisoned(&self) -> EngineError {
        EngineError::failed(&self.name, "scheduler lock poisoned")
    }
}

#[async_trait]
impl<C: RuleChecker> AnalysisEngine for RotatingEngine<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> ViolationSource {
        self.source
    }

    async fn analyze(
        &self,
        target: &Path,
        options: &ExecuteOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError> {
        let picked = self.scheduler.lock().map_err(|_| self.poisoned())?.next_rule();
        let Some(picked) = picked else {
            tracing::debug!(engine = %self.name, "no enabled rules");
            return Ok(Vec::new());
        };

        let start = Instant::now();
        let raw = self
            .checker
            .check_rule(target, &picked.rule_id, options, cancel)
            .await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        // Findings tagged with another rule belong to that rule's own check.
        let reported = raw.len();
        let fresh: Vec<Violation> = raw
            .into_iter()
            .filter(|v| v.rule.as_deref().map_or(true, |r| r == picked.rule_id))
            .collect();
        if fresh.len() < reported {
            tracing::debug!(
                engine = %self.name,
                rule = %picked.rule_id,
                dropped = reported - fresh.len(),
                "ignored findings from other rules"
            );
        }

        tracing::debug!(
            engine = %self.name,
            rule = %picked.rule_id,
            cycle = picked.cycle,
            forced = picked.forced,
            found = fresh.len(),
            elapsed_ms,
            "rule checked"
        );

        let check = RuleCheck {
            rule_id: picked.rule_id.clone(),
            engine: self.name.clone(),
            cycle: picked.cycle,
            violations_found: fresh.len(),
            execution_time_ms: elapsed_ms,
            forced: picked.forced,
        };

        let effective = {
            let mut scheduler = self.scheduler.lock().map_err(|_| self.poisoned())?;
            scheduler.record(&picked.rule_id, fresh);
            scheduler.effective_violations()
        };
        if let Ok(mut last) = self.last_check.lock() {
            *last = Some(check);
        }
        Ok(effective)
    }

    fn metadata(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Ok(scheduler) = self.scheduler.lock() {
            map.insert("rules".into(), Value::from(scheduler.entries().len()));
            let silent = scheduler
                .entries()
                .iter()
                .filter(|e| e.zero_streak > 0)
                .count();
            map.insert("silentRules".into(), Value::from(silent));
        }
        map
    }

    fn take_rule_check(&self) -> Option<RuleCheck> {
        self.last_check.lock().ok().and_then(|mut last| last.take())
    }

    fn schedule_snapshot(&self) -> Vec<RuleScheduleEntry> {
        self.scheduler
            .lock()
            .map(|s| s.entries().to_vec())
            .unwrap_or_default()
    }

    fn restore_schedule(&self, entries: &[RuleScheduleEntry]) {
        if let Ok(mut scheduler) = self.scheduler.lock() {
            scheduler.restore(entries);
        }
    }
}
