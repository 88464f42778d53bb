//! The shared violation record and its severity/source/category vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity levels for violations.
///
/// Declaration order is the merge rank: `Error < Warn < Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
        }
    }

    /// Sort rank used by the merge step (lower sorts first).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
        }
    }

    pub fn all() -> &'static [Severity] {
        &[Self::Error, Self::Warn, Self::Info]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// Which analyzer produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationSource {
    TypeAnalyzer,
    LintAnalyzer,
    UnusedExports,
    Custom,
}

impl ViolationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeAnalyzer => "type-analyzer",
            Self::LintAnalyzer => "lint-analyzer",
            Self::UnusedExports => "unused-exports",
            Self::Custom => "custom",
        }
    }

    pub fn all() -> &'static [ViolationSource] {
        &[
            Self::TypeAnalyzer,
            Self::LintAnalyzer,
            Self::UnusedExports,
            Self::Custom,
        ]
    }
}

impl fmt::Display for ViolationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|src| src.as_str() == s)
            .ok_or_else(|| format!("unknown violation source '{s}'"))
    }
}

/// Closed set of violation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    TypeAlias,
    Annotation,
    Cast,
    AnyType,
    NullCheck,
    ReturnType,
    UnusedVars,
    UnusedExports,
    Import,
    Style,
    Complexity,
    SyntaxError,
    SetupIssue,
    /// A type-aware rule reported by the pattern-based linter.
    LegacyTypeRule,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeAlias => "type-alias",
            Self::Annotation => "annotation",
            Self::Cast => "cast",
            Self::AnyType => "any-type",
            Self::NullCheck => "null-check",
            Self::ReturnType => "return-type",
            Self::UnusedVars => "unused-vars",
            Self::UnusedExports => "unused-exports",
            Self::Import => "import",
            Self::Style => "style",
            Self::Complexity => "complexity",
            Self::SyntaxError => "syntax-error",
            Self::SetupIssue => "setup-issue",
            Self::LegacyTypeRule => "legacy-type-rule",
            Self::Other => "other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::TypeAlias,
            Self::Annotation,
            Self::Cast,
            Self::AnyType,
            Self::NullCheck,
            Self::ReturnType,
            Self::UnusedVars,
            Self::UnusedExports,
            Self::Import,
            Self::Style,
            Self::Complexity,
            Self::SyntaxError,
            Self::SetupIssue,
            Self::LegacyTypeRule,
            Self::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// A single finding reported by an analyzer adapter.
///
/// `(file, line, code, source)` is the natural identity used for exact-match
/// deduplication. `category` and `severity` are derived by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Project-relative path.
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Raw offending text or tool message.
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_category")]
    pub category: Category,
    pub severity: Severity,
    /// Always overwritten by the adapter wrapper with the adapter's declared source.
    #[serde(default = "default_source")]
    pub source: ViolationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
}

fn default_category() -> Category {
    Category::Other
}

fn default_source() -> ViolationSource {
    ViolationSource::Custom
}

impl Violation {
    /// Minimal constructor; optional fields start empty.
    pub fn new(
        file: impl Into<String>,
        line: u32,
        code: impl Into<String>,
        severity: Severity,
        source: ViolationSource,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
            code: code.into(),
            category: Category::Other,
            severity,
            source,
            rule: None,
            message: None,
            fix_suggestion: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_fix_suggestion(mut self, fix: impl Into<String>) -> Self {
        self.fix_suggestion = Some(fix.into());
        self
    }

    /// The message if present and non-empty, otherwise the raw code.
    pub fn message_or_code(&self) -> &str {
        match self.message.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => &self.code,
        }
    }

    /// `file:line` location label.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rank_orders_error_first() {
        assert!(Severity::Error.rank() < Severity::Warn.rank());
        assert!(Severity::Warn.rank() < Severity::Info.rank());
        assert!(Severity::Error < Severity::Info);
    }

    #[test]
    fn severity_accepts_warning_alias() {
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn category_string_roundtrip() {
        for c in Category::all() {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), *c);
        }
    }

    #[test]
    fn violation_deserializes_wire_shape() {
        let json = r#"{
            "file": "src/a.ts",
            "line": 10,
            "code": "let x: any",
            "category": "any-type",
            "severity": "warn",
            "rule": "@typescript-eslint/no-explicit-any",
            "fixSuggestion": "use unknown"
        }"#;
        let v: Violation = serde_json::from_str(json).unwrap();
        assert_eq!(v.file, "src/a.ts");
        assert_eq!(v.category, Category::AnyType);
        assert_eq!(v.source, ViolationSource::Custom);
        assert_eq!(v.fix_suggestion.as_deref(), Some("use unknown"));
    }

    #[test]
    fn message_or_code_falls_back_on_empty_message() {
        let v = Violation::new("a.ts", 1, "raw", Severity::Info, ViolationSource::Custom)
            .with_message("");
        assert_eq!(v.message_or_code(), "raw");
    }
}
