//! Configuration system for Vigil.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod crossover_config;
pub mod engine_config;
pub mod orchestrator_config;
pub mod scheduler_config;
pub mod storage_config;
pub mod vigil_config;
pub mod watch_config;

pub use crossover_config::CrossoverConfig;
pub use engine_config::EngineConfig;
pub use orchestrator_config::OrchestratorConfig;
pub use scheduler_config::SchedulerConfig;
pub use storage_config::StorageConfig;
pub use vigil_config::{CliOverrides, VigilConfig};
pub use watch_config::WatchConfig;
