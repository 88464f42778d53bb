//! Orchestrator: runs every enabled adapter concurrently, then merges,
//! deduplicates, runs crossover detection, and summarizes.

pub mod dedup;
pub mod merge;
pub mod summary;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use vigil_core::config::VigilConfig;
use vigil_core::errors::{EngineError, PipelineError, VigilErrorCode};
use vigil_core::types::{DedupStrategy, Violation};

use crate::crossover::{self, CrossoverDetector, CrossoverWarning};
use crate::engine::{execute, AnalysisEngine, EngineResult, EngineSettings, ExecuteOptions};
use crate::factory;

pub use dedup::deduplicate;
pub use merge::merge_results;
pub use summary::{summarize, EngineFailure, EngineInfo, FileCount, OrchestrationSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    pub dedup_strategy: DedupStrategy,
    pub top_files: usize,
    pub fail_on_crossover: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from_config(&VigilConfig::default())
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &VigilConfig) -> Self {
        Self {
            dedup_strategy: config.orchestrator.effective_dedup_strategy(),
            top_files: config.orchestrator.effective_top_files(),
            fail_on_crossover: config.crossover.effective_fail_on_crossover(),
        }
    }
}

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    /// Merged and deduplicated.
    pub violations: Vec<Violation>,
    /// In priority order.
    pub engine_results: Vec<EngineResult>,
    pub crossover_warnings: Vec<CrossoverWarning>,
    pub summary: OrchestrationSummary,
    pub duration: Duration,
}

struct RegisteredEngine {
    engine: Arc<dyn AnalysisEngine>,
    settings: EngineSettings,
}

pub struct Orchestrator {
    engines: Vec<RegisteredEngine>,
    options: OrchestratorOptions,
    crossover: CrossoverDetector,
}

impl Orchestrator {
    pub fn new(options: OrchestratorOptions) -> Self {
        Self {
            engines: Vec::new(),
            options,
            crossover: CrossoverDetector::default(),
        }
    }

    /// Options, crossover detector, and every `[engines.*]` entry from config.
    pub fn from_config(config: &VigilConfig) -> Self {
        let mut orchestrator = Self::new(OrchestratorOptions::from_config(config))
            .with_crossover(CrossoverDetector::from_config(&config.crossover));
        for (engine, settings) in factory::build_engines(config) {
            orchestrator.register(engine, settings);
        }
        orchestrator
    }

    pub fn with_crossover(mut self, detector: CrossoverDetector) -> Self {
        self.crossover = detector;
        self
    }

    /// Add an adapter. An adapter with the same name is replaced in place.
    pub fn register(&mut self, engine: Arc<dyn AnalysisEngine>, settings: EngineSettings) {
        let entry = RegisteredEngine { engine, settings };
        match self
            .engines
            .iter_mut()
            .find(|e| e.engine.name() == entry.engine.name())
        {
            Some(existing) => *existing = entry,
            None => self.engines.push(entry),
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.engines.len();
        self.engines.retain(|e| e.engine.name() != name);
        self.engines.len() != before
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.engine.name()).collect()
    }

    /// Registered adapters, enabled or not, in registration order.
    pub fn engines(&self) -> impl Iterator<Item = &Arc<dyn AnalysisEngine>> {
        self.engines.iter().map(|e| &e.engine)
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn enabled_count(&self) -> usize {
        self.engines.iter().filter(|e| e.settings.enabled).count()
    }

    /// Run one orchestration pass over `target`.
    ///
    /// Every adapter is awaited before anything is merged. A failure from an
    /// adapter with `allow_failure = false` (or a panic in one) aborts the
    /// pass with that error once all adapters have settled.
    pub async fn run(
        &self,
        target: &Path,
        options: &ExecuteOptions,
    ) -> Result<OrchestrationResult, PipelineError> {
        let start = Instant::now();

        let mut active: Vec<&RegisteredEngine> =
            self.engines.iter().filter(|e| e.settings.enabled).collect();
        if active.is_empty() {
            return Err(PipelineError::NoEngines);
        }
        active.sort_by_key(|e| e.settings.priority);

        let handles: Vec<_> = active
            .iter()
            .map(|reg| {
                let engine = Arc::clone(&reg.engine);
                let settings = reg.settings.clone();
                let target = target.to_path_buf();
                let options = options.clone();
                tokio::spawn(async move { execute(engine.as_ref(), &settings, &target, &options).await })
            })
            .collect();

        let mut engine_results = Vec::with_capacity(active.len());
        let mut fatal: Option<EngineError> = None;

        for (reg, handle) in active.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    let error = EngineError::Panicked {
                        engine: reg.engine.name().to_string(),
                        message: join_err.to_string(),
                    };
                    tracing::warn!(engine = %reg.engine.name(), error = %error.coded_string(), "engine task aborted");
                    if reg.settings.allow_failure {
                        Ok(EngineResult::failed(
                            reg.engine.name(),
                            reg.engine.source(),
                            start.elapsed(),
                            error,
                        ))
                    } else {
                        Err(error)
                    }
                }
            };
            match outcome {
                Ok(result) => engine_results.push(result),
                Err(error) => {
                    if fatal.is_none() {
                        fatal = Some(error);
                    }
                }
            }
        }

        if let Some(error) = fatal {
            tracing::error!(
                engine = %error.engine(),
                error = %error.coded_string(),
                "non-recoverable engine failure, aborting cycle"
            );
            return Err(error.into());
        }

        let merged = merge_results(&engine_results);
        let merged_count = merged.len();
        let violations = deduplicate(merged, self.options.dedup_strategy);
        let crossover_warnings = self.crossover.detect(&violations, &engine_results);
        let summary = summarize(&violations, &engine_results, self.options.top_files);

        tracing::info!(
            engines = engine_results.len(),
            merged = merged_count,
            violations = violations.len(),
            crossover = crossover_warnings.len(),
            failed = summary.errors.len(),
            strategy = %self.options.dedup_strategy,
            "orchestration complete"
        );

        if self.options.fail_on_crossover {
            crossover::enforce_policy(&crossover_warnings)?;
        }

        Ok(OrchestrationResult {
            violations,
            engine_results,
            crossover_warnings,
            summary,
            duration: start.elapsed(),
        })
    }
}
