//! Crossover detection: flags overlapping responsibility between analyzers.
//!
//! Stateless over one merged, deduplicated batch. Produces advisory warnings,
//! never violations, and never mutates the batch.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use vigil_core::config::CrossoverConfig;
use vigil_core::errors::CrossoverError;
use vigil_core::types::{Category, Severity, Violation, ViolationSource};

use crate::engine::EngineResult;

/// Lint rules that need full type information to evaluate.
pub const TYPE_AWARE_RULES: &[&str] = &[
    "@typescript-eslint/await-thenable",
    "@typescript-eslint/no-base-to-string",
    "@typescript-eslint/no-floating-promises",
    "@typescript-eslint/no-for-in-array",
    "@typescript-eslint/no-misused-promises",
    "@typescript-eslint/no-unnecessary-condition",
    "@typescript-eslint/no-unnecessary-type-assertion",
    "@typescript-eslint/no-unsafe-argument",
    "@typescript-eslint/no-unsafe-assignment",
    "@typescript-eslint/no-unsafe-call",
    "@typescript-eslint/no-unsafe-member-access",
    "@typescript-eslint/no-unsafe-return",
    "@typescript-eslint/prefer-nullish-coalescing",
    "@typescript-eslint/prefer-optional-chain",
    "@typescript-eslint/prefer-readonly",
    "@typescript-eslint/require-await",
    "@typescript-eslint/restrict-plus-operands",
    "@typescript-eslint/restrict-template-expressions",
    "@typescript-eslint/strict-boolean-expressions",
    "@typescript-eslint/switch-exhaustiveness-check",
    "@typescript-eslint/unbound-method",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningType {
    TypeAwareRule,
    DuplicateViolation,
    ConfigurationConflict,
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeAwareRule => "type-aware-rule",
            Self::DuplicateViolation => "duplicate-violation",
            Self::ConfigurationConflict => "configuration-conflict",
        }
    }
}

impl fmt::Display for WarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory note about the batch as a whole. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossoverWarning {
    #[serde(rename = "type")]
    pub warning_type: WarningType,
    /// `Warn` or `Error`.
    pub severity: Severity,
    pub rules: Vec<String>,
    pub files: Vec<String>,
    pub message: String,
    pub suggestion: String,
}

pub struct CrossoverDetector {
    enabled: bool,
    type_aware_rules: FxHashSet<String>,
    slow_engine_threshold: Duration,
    watched_engines: FxHashSet<String>,
}

impl Default for CrossoverDetector {
    fn default() -> Self {
        Self::from_config(&CrossoverConfig::default())
    }
}

impl CrossoverDetector {
    pub fn from_config(config: &CrossoverConfig) -> Self {
        let mut type_aware_rules: FxHashSet<String> =
            TYPE_AWARE_RULES.iter().map(|r| r.to_string()).collect();
        type_aware_rules.extend(config.extra_type_aware_rules.iter().cloned());
        Self {
            enabled: config.effective_enabled(),
            type_aware_rules,
            slow_engine_threshold: Duration::from_millis(config.effective_slow_engine_threshold_ms()),
            watched_engines: config.watched_engines.iter().cloned().collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_type_aware(&self, rule: &str) -> bool {
        self.type_aware_rules.contains(rule)
    }

    /// Run every check. Empty when disabled.
    pub fn detect(&self, violations: &[Violation], results: &[EngineResult]) -> Vec<CrossoverWarning> {
        if !self.enabled {
            return Vec::new();
        }
        let mut warnings = Vec::new();
        warnings.extend(self.check_type_aware_rules(violations));
        warnings.extend(check_duplicate_locations(violations));
        warnings.extend(check_legacy_category(violations));
        warnings.extend(self.check_slow_engines(results));

        for w in &warnings {
            tracing::debug!(
                warning_type = %w.warning_type,
                severity = %w.severity,
                rules = w.rules.len(),
                files = w.files.len(),
                "crossover detected"
            );
        }
        warnings
    }

    fn check_type_aware_rules(&self, violations: &[Violation]) -> Option<CrossoverWarning> {
        let mut rules = BTreeSet::new();
        let mut files = BTreeSet::new();
        for v in violations {
            if v.source != ViolationSource::LintAnalyzer {
                continue;
            }
            if let Some(rule) = v.rule.as_deref().filter(|r| self.is_type_aware(r)) {
                rules.insert(rule.to_string());
                files.insert(v.file.clone());
            }
        }
        if rules.is_empty() {
            return None;
        }
        Some(CrossoverWarning {
            warning_type: WarningType::TypeAwareRule,
            severity: Severity::Error,
            message: format!(
                "The lint analyzer reported {} rule(s) that need full type information",
                rules.len()
            ),
            suggestion: "Disable these rules in the linter; the type analyzer already covers them"
                .to_string(),
            rules: rules.into_iter().collect(),
            files: files.into_iter().collect(),
        })
    }

    fn check_slow_engines(&self, results: &[EngineResult]) -> Vec<CrossoverWarning> {
        results
            .iter()
            .filter(|r| {
                r.source == ViolationSource::LintAnalyzer || self.watched_engines.contains(&r.engine_name)
            })
            .filter(|r| r.execution_time > self.slow_engine_threshold)
            .map(|r| CrossoverWarning {
                warning_type: WarningType::ConfigurationConflict,
                severity: Severity::Warn,
                rules: Vec::new(),
                files: Vec::new(),
                message: format!(
                    "Engine {} took {}ms (threshold {}ms)",
                    r.engine_name,
                    r.execution_ms(),
                    self.slow_engine_threshold.as_millis()
                ),
                suggestion: format!(
                    "Check whether {} is running type-aware rules; move them to the type analyzer",
                    r.engine_name
                ),
            })
            .collect()
    }
}

/// Locations hit by both the type analyzer and the lint analyzer.
fn check_duplicate_locations(violations: &[Violation]) -> Option<CrossoverWarning> {
    let mut seen: FxHashMap<(&str, u32), (bool, bool)> = FxHashMap::default();
    for v in violations {
        let slot = seen.entry((v.file.as_str(), v.line)).or_default();
        match v.source {
            ViolationSource::TypeAnalyzer => slot.0 = true,
            ViolationSource::LintAnalyzer => slot.1 = true,
            _ => {}
        }
    }

    let overlapping: FxHashSet<(&str, u32)> = seen
        .iter()
        .filter(|(_, (by_type, by_lint))| *by_type && *by_lint)
        .map(|(key, _)| *key)
        .collect();
    if overlapping.is_empty() {
        return None;
    }
    let locations = overlapping.len();
    let files: BTreeSet<String> = overlapping.iter().map(|(file, _)| file.to_string()).collect();

    let mut rules = BTreeSet::new();
    for v in violations {
        if v.source == ViolationSource::LintAnalyzer && overlapping.contains(&(v.file.as_str(), v.line)) {
            if let Some(rule) = &v.rule {
                rules.insert(rule.clone());
            }
        }
    }

    Some(CrossoverWarning {
        warning_type: WarningType::DuplicateViolation,
        severity: Severity::Warn,
        message: format!(
            "{locations} location(s) in {} file(s) were flagged by both the type analyzer and the lint analyzer",
            files.len()
        ),
        suggestion: "Pick one tool per concern and disable the overlapping rule in the other".to_string(),
        rules: rules.into_iter().collect(),
        files: files.into_iter().collect(),
    })
}

fn check_legacy_category(violations: &[Violation]) -> Option<CrossoverWarning> {
    let legacy: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.category == Category::LegacyTypeRule)
        .collect();
    if legacy.is_empty() {
        return None;
    }
    let rules: BTreeSet<String> = legacy.iter().filter_map(|v| v.rule.clone()).collect();
    let files: BTreeSet<String> = legacy.iter().map(|v| v.file.clone()).collect();
    Some(CrossoverWarning {
        warning_type: WarningType::ConfigurationConflict,
        severity: Severity::Warn,
        message: format!(
            "{} violation(s) come from type-aware rules running in the wrong tool",
            legacy.len()
        ),
        suggestion: "Move these rules to the type analyzer configuration".to_string(),
        rules: rules.into_iter().collect(),
        files: files.into_iter().collect(),
    })
}

/// The `fail_on_crossover` policy: error-level warnings become a failure.
pub fn enforce_policy(warnings: &[CrossoverWarning]) -> Result<(), CrossoverError> {
    let errors: Vec<&CrossoverWarning> = warnings
        .iter()
        .filter(|w| w.severity == Severity::Error)
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    let mut rules = BTreeSet::new();
    let mut files = BTreeSet::new();
    for w in &errors {
        rules.extend(w.rules.iter().cloned());
        files.extend(w.files.iter().cloned());
    }
    let summary = errors
        .iter()
        .map(|w| w.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(CrossoverError::PolicyViolation {
        count: errors.len(),
        summary,
        rules: rules.into_iter().collect(),
        files: files.into_iter().collect(),
    })
}
