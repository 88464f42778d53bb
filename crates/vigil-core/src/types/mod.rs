//! Shared domain types: the violation model and its derived identities.

pub mod categorize;
pub mod dedup;
pub mod fingerprint;
pub mod schedule;
pub mod violation;

pub use categorize::{categorize, lookup_rule};
pub use dedup::DedupStrategy;
pub use fingerprint::fingerprint;
pub use schedule::RuleScheduleEntry;
pub use violation::{Category, Severity, Violation, ViolationSource};
