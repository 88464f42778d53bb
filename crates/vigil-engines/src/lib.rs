//! # vigil-engines
//!
//! Runs heterogeneous analyzers behind one adapter contract, merges and
//! deduplicates their output, flags crossover between tools, and persists
//! each cycle through `vigil-storage`.

pub mod crossover;
pub mod engine;
pub mod engines;
pub mod factory;
pub mod orchestrator;
pub mod pipeline;
pub mod scheduler;
pub mod watch;

pub use crossover::{CrossoverDetector, CrossoverWarning, WarningType};
pub use engine::{AnalysisEngine, EngineResult, EngineSettings, ExecuteOptions, RuleCheck};
pub use orchestrator::{OrchestrationResult, Orchestrator, OrchestratorOptions};
pub use pipeline::{AnalysisPipeline, CycleReport};
pub use scheduler::{AdaptiveScheduler, SchedulerSettings};
pub use watch::{WatchLoop, WatchStats};
