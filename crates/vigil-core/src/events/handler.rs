//! VigilEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for handling Vigil events.
///
/// Handlers only override the events they care about. `Send + Sync` is
/// required because cycles run on the tokio runtime.
pub trait VigilEventHandler: Send + Sync {
    // ---- Cycle Lifecycle ----
    fn on_cycle_started(&self, _event: &CycleStartedEvent) {}
    fn on_cycle_completed(&self, _event: &CycleCompletedEvent) {}
    fn on_cycle_failed(&self, _event: &CycleFailedEvent) {}

    // ---- Engines ----
    fn on_engine_completed(&self, _event: &EngineCompletedEvent) {}
    fn on_engine_failed(&self, _event: &EngineFailedEvent) {}

    // ---- Crossover ----
    fn on_crossover_detected(&self, _event: &CrossoverDetectedEvent) {}

    // ---- Persistence ----
    fn on_violations_persisted(&self, _event: &ViolationsPersistedEvent) {}

    // ---- Errors ----
    fn on_error(&self, _event: &ErrorEvent) {}
}
