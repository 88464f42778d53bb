//! Data-driven categorization: rule id → category lookup tables.
//!
//! Resolution order: exact rule table, rule prefix table, source default,
//! then `Category::Other`.

use super::violation::{Category, ViolationSource};

/// Exact rule identifiers.
const RULE_TABLE: &[(&str, Category)] = &[
    // Type analyzer diagnostics
    ("TS2304", Category::Import),
    ("TS2305", Category::Import),
    ("TS2307", Category::Import),
    ("TS2322", Category::TypeAlias),
    ("TS2345", Category::TypeAlias),
    ("TS2352", Category::Cast),
    ("TS2366", Category::ReturnType),
    ("TS2531", Category::NullCheck),
    ("TS2532", Category::NullCheck),
    ("TS2533", Category::NullCheck),
    ("TS18047", Category::NullCheck),
    ("TS18048", Category::NullCheck),
    ("TS6133", Category::UnusedVars),
    ("TS6196", Category::UnusedVars),
    ("TS7006", Category::Annotation),
    ("TS7031", Category::Annotation),
    ("TS7010", Category::ReturnType),
    ("TS18003", Category::SetupIssue),
    // Lint analyzer rules
    ("no-unused-vars", Category::UnusedVars),
    ("@typescript-eslint/no-unused-vars", Category::UnusedVars),
    ("@typescript-eslint/no-explicit-any", Category::AnyType),
    ("@typescript-eslint/consistent-type-definitions", Category::TypeAlias),
    ("@typescript-eslint/consistent-type-assertions", Category::Cast),
    ("@typescript-eslint/explicit-function-return-type", Category::ReturnType),
    ("@typescript-eslint/explicit-module-boundary-types", Category::Annotation),
    ("@typescript-eslint/typedef", Category::Annotation),
    ("@typescript-eslint/no-non-null-assertion", Category::NullCheck),
    ("import/no-unresolved", Category::Import),
    ("import/order", Category::Import),
    ("no-duplicate-imports", Category::Import),
    ("prefer-const", Category::Style),
    ("semi", Category::Style),
    ("quotes", Category::Style),
    ("indent", Category::Style),
    ("eqeqeq", Category::Style),
    ("complexity", Category::Complexity),
    ("max-depth", Category::Complexity),
    ("max-lines-per-function", Category::Complexity),
    ("max-params", Category::Complexity),
    ("parsing-error", Category::SyntaxError),
];

/// Rule prefixes, checked in order after the exact table misses.
const PREFIX_TABLE: &[(&str, Category)] = &[
    // tsc 1xxx diagnostics are scanner/parser errors.
    ("TS1", Category::SyntaxError),
    // tsc 5xxx diagnostics are compiler option / tsconfig problems.
    ("TS5", Category::SetupIssue),
    ("TS6053", Category::SetupIssue),
    ("@typescript-eslint/naming-convention", Category::Style),
    ("@typescript-eslint/no-unsafe-", Category::LegacyTypeRule),
    ("@typescript-eslint/strict-boolean-", Category::LegacyTypeRule),
];

/// Category for a rule reported by `source`.
pub fn categorize(source: ViolationSource, rule: Option<&str>) -> Category {
    if let Some(rule) = rule {
        if let Some(cat) = lookup_rule(rule) {
            return cat;
        }
    }
    match source {
        ViolationSource::UnusedExports => Category::UnusedExports,
        _ => Category::Other,
    }
}

/// Table lookup without the source fallback.
pub fn lookup_rule(rule: &str) -> Option<Category> {
    let rule = rule.trim();
    if rule.is_empty() {
        return None;
    }
    RULE_TABLE
        .iter()
        .find(|(id, _)| *id == rule)
        .map(|(_, cat)| *cat)
        .or_else(|| {
            PREFIX_TABLE
                .iter()
                .find(|(prefix, _)| rule.starts_with(prefix))
                .map(|(_, cat)| *cat)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_rules_win_over_prefixes() {
        // TS18003 would otherwise match the "TS1" syntax prefix.
        assert_eq!(lookup_rule("TS18003"), Some(Category::SetupIssue));
        assert_eq!(lookup_rule("TS18048"), Some(Category::NullCheck));
    }

    #[test]
    fn prefix_table_covers_tsc_ranges() {
        assert_eq!(lookup_rule("TS1005"), Some(Category::SyntaxError));
        assert_eq!(lookup_rule("TS5023"), Some(Category::SetupIssue));
    }

    #[test]
    fn unknown_rule_falls_into_default_bucket() {
        assert_eq!(
            categorize(ViolationSource::LintAnalyzer, Some("my-plugin/whatever")),
            Category::Other
        );
        assert_eq!(categorize(ViolationSource::Custom, None), Category::Other);
    }

    #[test]
    fn unused_exports_source_default() {
        assert_eq!(
            categorize(ViolationSource::UnusedExports, None),
            Category::UnusedExports
        );
    }

    #[test]
    fn type_aware_lint_rules_are_legacy() {
        assert_eq!(
            lookup_rule("@typescript-eslint/no-unsafe-assignment"),
            Some(Category::LegacyTypeRule)
        );
    }
}
