//! # vigil-core
//!
//! Foundation crate for the Vigil analysis orchestrator.
//! Defines the violation model, fingerprinting, categorization, errors,
//! configuration, events, tracing setup, cancellation, and constants.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod traits;
pub mod tracing;
pub mod types;

pub use types::{Category, Severity, Violation, ViolationSource};
