//! EventDispatcher: synchronous event dispatch with zero overhead when empty.

use std::sync::Arc;

use super::handler::VigilEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn VigilEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn VigilEventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler is logged and does not stop later handlers.
    fn emit<F: Fn(&dyn VigilEventHandler)>(&self, event: &'static str, f: F) {
        for (index, handler) in self.handlers.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!(event, handler = index, "event handler panicked");
            }
        }
    }

    // ---- Cycle Lifecycle ----
    pub fn emit_cycle_started(&self, event: &CycleStartedEvent) {
        self.emit("cycle_started", |h| h.on_cycle_started(event));
    }

    pub fn emit_cycle_completed(&self, event: &CycleCompletedEvent) {
        self.emit("cycle_completed", |h| h.on_cycle_completed(event));
    }

    pub fn emit_cycle_failed(&self, event: &CycleFailedEvent) {
        self.emit("cycle_failed", |h| h.on_cycle_failed(event));
    }

    // ---- Engines ----
    pub fn emit_engine_completed(&self, event: &EngineCompletedEvent) {
        self.emit("engine_completed", |h| h.on_engine_completed(event));
    }

    pub fn emit_engine_failed(&self, event: &EngineFailedEvent) {
        self.emit("engine_failed", |h| h.on_engine_failed(event));
    }

    // ---- Crossover ----
    pub fn emit_crossover_detected(&self, event: &CrossoverDetectedEvent) {
        self.emit("crossover_detected", |h| h.on_crossover_detected(event));
    }

    // ---- Persistence ----
    pub fn emit_violations_persisted(&self, event: &ViolationsPersistedEvent) {
        self.emit("violations_persisted", |h| h.on_violations_persisted(event));
    }

    // ---- Errors ----
    pub fn emit_error(&self, event: &ErrorEvent) {
        self.emit("error", |h| h.on_error(event));
    }
}
