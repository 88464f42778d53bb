//! Scripted adapters shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vigil_core::errors::EngineError;
use vigil_core::events::types::{
    CrossoverDetectedEvent, CycleCompletedEvent, CycleFailedEvent, CycleStartedEvent,
    EngineFailedEvent, ErrorEvent, ViolationsPersistedEvent,
};
use vigil_core::events::VigilEventHandler;
use vigil_core::traits::CancellationToken;
use vigil_core::types::{Severity, Violation, ViolationSource};
use vigil_engines::{AnalysisEngine, EngineSettings, ExecuteOptions};

pub enum Script {
    /// Call `n` returns `batches[n]`; the last batch repeats.
    Batches(Vec<Vec<Violation>>),
    Fail(String),
    Panic,
    Delayed(Duration, Vec<Violation>),
    /// The first call returns the batch; every later call fails.
    ThenFail(Vec<Violation>, String),
}

pub struct FakeEngine {
    name: String,
    source: ViolationSource,
    script: Script,
    calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new(name: &str, source: ViolationSource, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            source,
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn returning(name: &str, source: ViolationSource, violations: Vec<Violation>) -> Arc<Self> {
        Self::new(name, source, Script::Batches(vec![violations]))
    }

    pub fn failing(name: &str, message: &str) -> Arc<Self> {
        Self::new(name, ViolationSource::Custom, Script::Fail(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisEngine for FakeEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> ViolationSource {
        self.source
    }

    async fn analyze(
        &self,
        _target: &Path,
        _options: &ExecuteOptions,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Batches(batches) => Ok(batches
                .get(call.min(batches.len().saturating_sub(1)))
                .cloned()
                .unwrap_or_default()),
            Script::Fail(message) => Err(EngineError::failed(&self.name, message.clone())),
            Script::Panic => panic!("{} blew up", self.name),
            Script::Delayed(delay, violations) => {
                tokio::time::sleep(*delay).await;
                Ok(violations.clone())
            }
            Script::ThenFail(violations, message) => match call {
                0 => Ok(violations.clone()),
                _ => Err(EngineError::failed(&self.name, message.clone())),
            },
        }
    }
}

pub fn dynamic(engine: Arc<FakeEngine>) -> Arc<dyn AnalysisEngine> {
    engine
}

pub fn v(file: &str, line: u32, code: &str, severity: Severity) -> Violation {
    Violation::new(file, line, code, severity, ViolationSource::Custom)
}

pub fn lenient() -> EngineSettings {
    EngineSettings::default()
}

pub fn strict() -> EngineSettings {
    EngineSettings {
        allow_failure: false,
        ..Default::default()
    }
}

pub fn priority(priority: i32) -> EngineSettings {
    EngineSettings {
        priority,
        ..Default::default()
    }
}

/// Records event names in arrival order.
#[derive(Default)]
pub struct Recorder {
    pub log: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl VigilEventHandler for Recorder {
    fn on_cycle_started(&self, event: &CycleStartedEvent) {
        self.push(format!("started:{}", event.cycle));
    }

    fn on_cycle_completed(&self, event: &CycleCompletedEvent) {
        self.push(format!("completed:{}", event.cycle));
    }

    fn on_cycle_failed(&self, event: &CycleFailedEvent) {
        self.push(format!("failed:{}:{}", event.cycle, event.error_code));
    }

    fn on_engine_failed(&self, event: &EngineFailedEvent) {
        self.push(format!("engine_failed:{}:{}", event.engine, event.recoverable));
    }

    fn on_crossover_detected(&self, event: &CrossoverDetectedEvent) {
        self.push(format!("crossover:{}", event.warning_type));
    }

    fn on_violations_persisted(&self, event: &ViolationsPersistedEvent) {
        self.push(format!("persisted:{}:{}", event.added, event.removed));
    }

    fn on_error(&self, event: &ErrorEvent) {
        self.push(format!("error:{}", event.error_code));
    }
}
