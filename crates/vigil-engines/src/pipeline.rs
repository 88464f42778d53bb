//! One full cycle: orchestrate, persist, emit events.
//!
//! Cycles are serialized by an async mutex; a new cycle starts only after the
//! previous one's persistence step has finished. All storage work runs on
//! the blocking pool.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use vigil_core::config::VigilConfig;
use vigil_core::errors::{PipelineError, StorageError, VigilErrorCode};
use vigil_core::events::types::{
    CrossoverDetectedEvent, CycleCompletedEvent, CycleFailedEvent, CycleStartedEvent,
    EngineCompletedEvent, EngineFailedEvent, ViolationsPersistedEvent,
};
use vigil_core::events::EventDispatcher;
use vigil_core::types::{RuleScheduleEntry, Violation, ViolationSource};
use vigil_storage::queries::rule_checks::CYCLE_SCOPE;
use vigil_storage::{CheckStatus, DeltaSummary, RetentionReport, StoreOutcome, ViolationStore};

use crate::engine::{ExecuteOptions, RuleCheck};
use crate::orchestrator::{OrchestrationResult, Orchestrator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Resolve fingerprints that disappeared since the previous check.
    /// Findings from an adapter that failed in the same cycle are never
    /// resolved this way.
    pub auto_resolve_removed: bool,
    pub retention_days: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&VigilConfig::default())
    }
}

impl PipelineSettings {
    pub fn from_config(config: &VigilConfig) -> Self {
        Self {
            auto_resolve_removed: config.storage.effective_auto_resolve_removed(),
            retention_days: config.storage.effective_retention_days(),
        }
    }
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    /// `rule_checks` row for the cycle; also the history check id.
    pub check_id: i64,
    pub orchestration: OrchestrationResult,
    pub stored: StoreOutcome,
    pub deltas: DeltaSummary,
    /// Fingerprints explicitly resolved because they disappeared.
    pub resolved: usize,
    pub rule_checks: Vec<RuleCheck>,
    pub duration: Duration,
}

pub struct AnalysisPipeline {
    orchestrator: Orchestrator,
    store: Arc<ViolationStore>,
    events: Arc<EventDispatcher>,
    settings: PipelineSettings,
    cycle: tokio::sync::Mutex<u64>,
}

struct Persisted {
    stored: StoreOutcome,
    deltas: DeltaSummary,
    resolved: usize,
}

impl AnalysisPipeline {
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<ViolationStore>,
        events: Arc<EventDispatcher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            orchestrator,
            store,
            events,
            settings,
            cycle: tokio::sync::Mutex::new(0),
        }
    }

    /// Open the configured database under `root` and build every engine.
    pub fn from_config(
        config: &VigilConfig,
        root: &Path,
        events: Arc<EventDispatcher>,
    ) -> Result<Self, PipelineError> {
        let db_path = config.storage.effective_db_path(root);
        let store = ViolationStore::open(&db_path, config.storage.effective_batch_size())?;
        tracing::info!(db = %db_path.display(), engines = config.engines.len(), "pipeline ready");
        Ok(Self::new(
            Orchestrator::from_config(config),
            Arc::new(store),
            events,
            PipelineSettings::from_config(config),
        ))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn store(&self) -> &Arc<ViolationStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&ViolationStore) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StorageError::TaskFailed {
                message: e.to_string(),
            })?
    }

    /// Load persisted schedules into every rotating engine. Returns the
    /// number of entries restored.
    pub async fn restore_schedules(&self) -> Result<usize, PipelineError> {
        let mut restored = 0;
        for engine in self.orchestrator.engines() {
            if engine.schedule_snapshot().is_empty() {
                continue;
            }
            let name = engine.name().to_string();
            let entries = self.blocking(move |store| store.load_schedules(&name)).await?;
            restored += entries.len();
            engine.restore_schedule(&entries);
        }
        tracing::debug!(restored, "schedules restored");
        Ok(restored)
    }

    /// Purge data older than the configured retention window.
    pub async fn run_retention(&self) -> Result<RetentionReport, PipelineError> {
        let days = self.settings.retention_days;
        let report = self.blocking(move |store| store.cleanup_old_data(days)).await?;
        tracing::info!(
            days,
            deleted = report.total_deleted,
            duration_ms = report.duration_ms,
            "retention cleanup"
        );
        Ok(report)
    }

    /// Run one cycle over `target`. Waits for any cycle already in flight.
    pub async fn run_cycle(&self, target: &Path) -> Result<CycleReport, PipelineError> {
        let mut counter = self.cycle.lock().await;
        *counter += 1;
        let cycle = *counter;
        let start = Instant::now();

        self.events.emit_cycle_started(&CycleStartedEvent {
            cycle,
            target: target.to_path_buf(),
            engine_count: self.orchestrator.enabled_count(),
        });
        tracing::info!(cycle, path = %target.display(), "cycle started");

        let check_id = match self
            .blocking(|store| store.begin_check(CYCLE_SCOPE, CYCLE_SCOPE))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                let error = PipelineError::from(e);
                self.fail_cycle(cycle, None, start, &error).await;
                return Err(error);
            }
        };

        let options = ExecuteOptions {
            cycle,
            ..Default::default()
        };
        let orchestration = match self.orchestrator.run(target, &options).await {
            Ok(result) => result,
            Err(error) => {
                if let PipelineError::Engine(e) = &error {
                    self.events.emit_engine_failed(&EngineFailedEvent {
                        engine: e.engine().to_string(),
                        message: e.to_string(),
                        recoverable: false,
                    });
                }
                self.fail_cycle(cycle, Some(check_id), start, &error).await;
                return Err(error);
            }
        };

        self.emit_engine_events(&orchestration);

        let rule_checks: Vec<RuleCheck> = orchestration
            .engine_results
            .iter()
            .filter_map(|r| r.rule_check.clone())
            .collect();
        let schedules: Vec<RuleScheduleEntry> = self
            .orchestrator
            .engines()
            .flat_map(|e| e.schedule_snapshot())
            .collect();

        let failed_sources: FxHashSet<ViolationSource> = orchestration
            .engine_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.source)
            .collect();

        let persisted = {
            let batch = orchestration.violations.clone();
            let checks = rule_checks.clone();
            let auto_resolve = self.settings.auto_resolve_removed;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            self.blocking(move |store| {
                let resolve = auto_resolve.then_some(&failed_sources);
                persist(store, check_id, &batch, &checks, &schedules, resolve, elapsed_ms)
            })
            .await
        };
        let persisted = match persisted {
            Ok(p) => p,
            Err(e) => {
                let error = PipelineError::from(e);
                self.fail_cycle(cycle, Some(check_id), start, &error).await;
                return Err(error);
            }
        };

        self.events.emit_violations_persisted(&ViolationsPersistedEvent {
            check_id,
            inserted: persisted.stored.inserted,
            updated: persisted.stored.updated,
            rejected: persisted.stored.errors.len(),
            added: persisted.deltas.added,
            removed: persisted.deltas.removed,
            unchanged: persisted.deltas.unchanged,
        });

        let duration = start.elapsed();
        self.events.emit_cycle_completed(&CycleCompletedEvent {
            cycle,
            check_id,
            total_violations: orchestration.violations.len(),
            crossover_warnings: orchestration.crossover_warnings.len(),
            engine_errors: orchestration.summary.errors.len(),
            duration_ms: duration.as_millis() as u64,
        });
        tracing::info!(
            cycle,
            check_id,
            violations = orchestration.violations.len(),
            added = persisted.deltas.added,
            removed = persisted.deltas.removed,
            resolved = persisted.resolved,
            elapsed_ms = duration.as_millis() as u64,
            "cycle completed"
        );

        Ok(CycleReport {
            cycle,
            check_id,
            orchestration,
            stored: persisted.stored,
            deltas: persisted.deltas,
            resolved: persisted.resolved,
            rule_checks,
            duration,
        })
    }

    fn emit_engine_events(&self, orchestration: &OrchestrationResult) {
        for result in &orchestration.engine_results {
            match &result.error {
                None => self.events.emit_engine_completed(&EngineCompletedEvent {
                    engine: result.engine_name.clone(),
                    violations: result.violations.len(),
                    duration_ms: result.execution_ms(),
                }),
                Some(error) => self.events.emit_engine_failed(&EngineFailedEvent {
                    engine: result.engine_name.clone(),
                    message: error.to_string(),
                    recoverable: true,
                }),
            }
        }
        for warning in &orchestration.crossover_warnings {
            self.events.emit_crossover_detected(&CrossoverDetectedEvent {
                warning_type: warning.warning_type.to_string(),
                severity: warning.severity.to_string(),
                message: warning.message.clone(),
            });
        }
    }

    async fn fail_cycle(&self, cycle: u64, check_id: Option<i64>, start: Instant, error: &PipelineError) {
        if let Some(id) = check_id {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let closed = self
                .blocking(move |store| store.complete_check(id, CheckStatus::Failed, 0, elapsed_ms))
                .await;
            if let Err(e) = closed {
                tracing::warn!(check_id = id, error = %e.coded_string(), "could not mark check failed");
            }
        }
        tracing::error!(cycle, error = %error.coded_string(), "cycle failed");
        self.events.emit_cycle_failed(&CycleFailedEvent {
            cycle,
            message: error.to_string(),
            error_code: error.error_code().to_string(),
        });
    }
}

fn persist(
    store: &ViolationStore,
    check_id: i64,
    batch: &[Violation],
    rule_checks: &[RuleCheck],
    schedules: &[RuleScheduleEntry],
    resolve_except: Option<&FxHashSet<ViolationSource>>,
    elapsed_ms: u64,
) -> Result<Persisted, StorageError> {
    let stored = store.store_violations(batch)?;
    for error in &stored.errors {
        tracing::warn!(check_id, %error, "violation rejected");
    }

    let deltas = store.record_violation_deltas(check_id, &stored.fingerprints)?;
    let resolved = match resolve_except {
        Some(failed) => {
            let targets = resolvable(store, &deltas.removed_fingerprints, failed)?;
            store.resolve_violations(&targets)?
        }
        None => 0,
    };

    for check in rule_checks {
        store.record_rule_check(
            &check.rule_id,
            &check.engine,
            check.violations_found,
            check.execution_time_ms,
        )?;
    }
    if !schedules.is_empty() {
        store.save_schedules(schedules)?;
    }

    store.complete_check(check_id, CheckStatus::Completed, stored.fingerprints.len(), elapsed_ms)?;
    Ok(Persisted {
        stored,
        deltas,
        resolved,
    })
}

/// Removed fingerprints whose source did not fail this cycle. A failed
/// adapter reports nothing, so its findings only look removed.
fn resolvable(
    store: &ViolationStore,
    removed: &[String],
    failed: &FxHashSet<ViolationSource>,
) -> Result<Vec<String>, StorageError> {
    if failed.is_empty() {
        return Ok(removed.to_vec());
    }
    let mut keep = Vec::with_capacity(removed.len());
    for fp in removed {
        match store.get_violation(fp)? {
            Some(record) if failed.contains(&record.violation.source) => {
                tracing::debug!(fingerprint = %fp, source = %record.violation.source, "source failed, not resolving");
            }
            _ => keep.push(fp.clone()),
        }
    }
    Ok(keep)
}
