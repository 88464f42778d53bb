//! The shared execution wrapper around `AnalysisEngine::analyze`.

use std::path::Path;
use std::time::Instant;

use serde_json::Value;
use vigil_core::errors::{EngineError, VigilErrorCode};
use vigil_core::traits::{Cancellable, CancellationToken};

use super::normalize::normalize_violations;
use super::{AnalysisEngine, EngineResult, EngineSettings, ExecuteOptions};

/// Run one adapter with a fresh cancellation token and its own timeout.
///
/// On timeout the token is cancelled, the in-flight `analyze` future is
/// dropped, and a `Timeout` error is synthesized. Errors degrade to an empty
/// unsuccessful result when `allow_failure` is set and propagate otherwise.
pub async fn execute(
    engine: &dyn AnalysisEngine,
    settings: &EngineSettings,
    target: &Path,
    options: &ExecuteOptions,
) -> Result<EngineResult, EngineError> {
    let name = engine.name().to_string();
    let source = engine.source();
    let token = CancellationToken::new();
    let start = Instant::now();

    tracing::debug!(engine = %name, cycle = options.cycle, "engine started");

    let outcome = tokio::select! {
        result = engine.analyze(target, options, &token) => result,
        _ = tokio::time::sleep(settings.timeout) => {
            token.cancel();
            Err(EngineError::Timeout {
                engine: name.clone(),
                timeout_ms: settings.timeout.as_millis() as u64,
            })
        }
    };
    let execution_time = start.elapsed();

    match outcome {
        Ok(raw) => {
            let violations = normalize_violations(raw, source);
            let rule_check = engine.take_rule_check();
            let mut metadata = engine.metadata();
            if let Some(check) = &rule_check {
                metadata.insert("checkedRule".into(), Value::from(check.rule_id.clone()));
                metadata.insert("cycle".into(), Value::from(check.cycle));
                metadata.insert("forced".into(), Value::from(check.forced));
            }
            tracing::debug!(
                engine = %name,
                violations = violations.len(),
                elapsed_ms = execution_time.as_millis() as u64,
                "engine completed"
            );
            Ok(EngineResult {
                engine_name: name,
                source,
                violations,
                execution_time,
                success: true,
                error: None,
                metadata,
                rule_check,
            })
        }
        Err(error) => {
            tracing::warn!(
                engine = %name,
                error = %error.coded_string(),
                elapsed_ms = execution_time.as_millis() as u64,
                allow_failure = settings.allow_failure,
                "engine failed"
            );
            if settings.allow_failure {
                Ok(EngineResult::failed(name, source, execution_time, error))
            } else {
                Err(error)
            }
        }
    }
}
