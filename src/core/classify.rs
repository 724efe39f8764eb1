//! First-match-wins classification of scanned paths.
//!
//! Rules are tried in rule-set order. A rule matches when its glob matches
//! the path and every placeholder in its destination resolves; the first such
//! rule decides both category and destination. A path no rule matches is
//! [`Category::Unclassified`] and has no destination. The result depends only
//! on the path and the rule order, so classifying twice yields the same file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::category::{Category, TestFile};
use crate::core::rules::RuleSet;

/// Classify one path (relative to the project root).
#[must_use]
pub fn classify(path: &Path, rules: &RuleSet) -> TestFile {
    for rule in rules.iter() {
        if let Some(destination) = rule.destination_for(path) {
            tracing::trace!(path = %path.display(), rule = rule.name(), "classified");
            return TestFile {
                path: path.to_path_buf(),
                category: rule.category(),
                destination: Some(destination),
                rule: Some(rule.name().to_string()),
            };
        }
    }
    tracing::debug!(path = %path.display(), "no rule matched");
    TestFile::unclassified(path)
}

/// How one rule treated a path, for `rules --explain`.
#[derive(Debug, Clone, Serialize)]
pub struct RuleEvaluation {
    pub rule: String,
    pub category: Category,
    pub glob_matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

/// Evaluate rules in order up to and including the first full match.
#[must_use]
pub fn explain(path: &Path, rules: &RuleSet) -> Vec<RuleEvaluation> {
    let mut trace = Vec::new();
    for rule in rules.iter() {
        let destination = rule.destination_for(path);
        let done = destination.is_some();
        trace.push(RuleEvaluation {
            rule: rule.name().to_string(),
            category: rule.category(),
            glob_matched: done || rule.matches_glob(path),
            destination,
        });
        if done {
            break;
        }
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> RuleSet {
        RuleSet::builtin().unwrap()
    }

    fn check(path: &str, category: Category, destination: &str) {
        let file = classify(Path::new(path), &builtin());
        assert_eq!(file.category, category, "category of {path}");
        assert_eq!(
            file.destination.as_deref(),
            Some(Path::new(destination)),
            "destination of {path}"
        );
    }

    #[test]
    fn sit_test_goes_to_e2e_ui() {
        check(
            "tests/connectx_api/sit_tests/test_login.py",
            Category::E2e,
            "tests/e2e/connectx_api/ui/test_login.py",
        );
    }

    #[test]
    fn sprint_test_goes_to_integration_feature() {
        check(
            "tests/connectx_api/tests/sprint-1_NetworkCoverage/test_valid_zip.py",
            Category::Integration,
            "tests/integration/connectx_api/network_coverage/test_valid_zip.py",
        );
    }

    #[test]
    fn page_objects_and_conftest_under_sit() {
        check(
            "tests/connectx_api/sit_tests/pages/login_page.py",
            Category::Helper,
            "tests/e2e/connectx_api/pages/login_page.py",
        );
        check(
            "tests/connectx_api/sit_tests/conftest.py",
            Category::Fixture,
            "tests/e2e/connectx_api/conftest.py",
        );
    }

    #[test]
    fn nested_sprint_structure_is_kept_below_feature() {
        check(
            "tests/connectx_api/tests/sprint-4_Billing/invoices/test_totals.py",
            Category::Integration,
            "tests/integration/connectx_api/billing/invoices/test_totals.py",
        );
    }

    #[test]
    fn support_directories() {
        check(
            "tests/connectx_api/utils/api_client.py",
            Category::Helper,
            "tests/helpers/connectx_api/api_client.py",
        );
        check(
            "tests/connectx_api/data/zips.json",
            Category::Fixture,
            "tests/fixtures/connectx_api/data/zips.json",
        );
        check(
            "tests/connectx_api/reports/run.html",
            Category::Report,
            "reports/connectx_api/run.html",
        );
        check(
            "tests/connectx_api/conftest.py",
            Category::Fixture,
            "tests/fixtures/connectx_api/conftest.py",
        );
    }

    #[test]
    fn migrated_files_are_in_place() {
        let file = classify(Path::new("tests/e2e/connectx_api/ui/test_login.py"), &builtin());
        assert_eq!(file.category, Category::E2e);
        assert!(file.is_in_place());
        assert_eq!(file.rule.as_deref(), Some("migrated-e2e"));
    }

    #[test]
    fn unmatched_path_is_unclassified() {
        let file = classify(Path::new("tests/connectx_api/notes/todo.py"), &builtin());
        assert_eq!(file.category, Category::Unclassified);
        assert!(file.destination.is_none());
        assert!(file.rule.is_none());
    }

    #[test]
    fn classification_is_deterministic_and_idempotent() {
        let rules = builtin();
        let path = Path::new("tests/connectx_api/tests/sprint-2_Auth/test_token.py");
        let first = classify(path, &rules);
        let second = classify(path, &rules);
        assert_eq!(first, second);

        // Classifying the destination again keeps it where it is.
        let moved = classify(first.destination.as_deref().unwrap(), &rules);
        assert_eq!(moved.category, first.category);
        assert!(moved.is_in_place());
    }

    #[test]
    fn first_match_wins_in_file_order() {
        let raw = r#"
            [[rule]]
            name = "everything-unit"
            pattern = "**/*"
            category = "unit"
            destination = "{tests_dir}/unit/{file}"

            [[rule]]
            name = "never-reached"
            pattern = "**/*"
            category = "e2e"
            destination = "{tests_dir}/e2e/{file}"
        "#;
        let rules = RuleSet::from_toml_str(raw, Path::new("r.toml")).unwrap();
        let file = classify(Path::new("tests/api/sit_tests/test_a.py"), &rules);
        assert_eq!(file.rule.as_deref(), Some("everything-unit"));
    }

    #[test]
    fn unresolvable_placeholder_falls_through() {
        let raw = r#"
            [[rule]]
            name = "needs-sprint"
            pattern = "**/*"
            category = "integration"
            destination = "by-sprint/{sprint}/{file}"

            [[rule]]
            name = "fallback"
            pattern = "**/*"
            category = "unit"
            destination = "other/{file}"
        "#;
        let rules = RuleSet::from_toml_str(raw, Path::new("r.toml")).unwrap();
        let file = classify(Path::new("tests/api/test_a.py"), &rules);
        assert_eq!(file.rule.as_deref(), Some("fallback"));
    }

    #[test]
    fn explain_stops_at_first_match() {
        let rules = builtin();
        let trace = explain(Path::new("tests/connectx_api/sit_tests/test_login.py"), &rules);
        let last = trace.last().unwrap();
        assert_eq!(last.rule, "sit-tests");
        assert!(last.glob_matched);
        assert!(last.destination.is_some());
        assert!(trace[..trace.len() - 1].iter().all(|e| e.destination.is_none()));
    }

    #[test]
    fn explain_unmatched_evaluates_every_rule() {
        let rules = builtin();
        let trace = explain(Path::new("README.md"), &rules);
        assert_eq!(trace.len(), rules.len());
        assert!(trace.iter().all(|e| !e.glob_matched));
    }
}
