//! Concrete adapters.

pub mod process;
pub mod rotating;

pub use process::ProcessEngine;
pub use rotating::{RotatingEngine, RuleChecker};
