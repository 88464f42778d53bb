//! Builds adapters from `[engines.<name>]` configuration.

use std::sync::Arc;
use std::time::Duration;

use vigil_core::config::{EngineConfig, VigilConfig};

use crate::engine::{AnalysisEngine, EngineSettings};
use crate::engines::{ProcessEngine, RotatingEngine};
use crate::scheduler::SchedulerSettings;

/// Settings for one configured engine, falling back to the orchestrator's
/// default timeout.
pub fn engine_settings(config: &VigilConfig, engine: &EngineConfig) -> EngineSettings {
    let timeout_ms = engine
        .timeout_ms
        .unwrap_or_else(|| config.orchestrator.effective_default_timeout_ms());
    EngineSettings {
        priority: engine.effective_priority(),
        timeout: Duration::from_millis(timeout_ms),
        allow_failure: engine.effective_allow_failure(),
        enabled: engine.effective_enabled(),
    }
}

/// One adapter per configured engine, in name order. Engines with a `rules`
/// list rotate through them under the adaptive scheduler.
pub fn build_engines(config: &VigilConfig) -> Vec<(Arc<dyn AnalysisEngine>, EngineSettings)> {
    let scheduler = SchedulerSettings::from(&config.scheduler);
    config
        .engines
        .iter()
        .map(|(name, engine_config)| {
            let settings = engine_settings(config, engine_config);
            let process = ProcessEngine::from_config(name, engine_config);
            let engine: Arc<dyn AnalysisEngine> = if engine_config.is_rotating() {
                tracing::debug!(engine = %name, rules = engine_config.rules.len(), "building rotating engine");
                Arc::new(RotatingEngine::new(
                    name.clone(),
                    engine_config.effective_source(),
                    process,
                    engine_config.rules.clone(),
                    scheduler,
                ))
            } else {
                Arc::new(process)
            };
            (engine, settings)
        })
        .collect()
}
