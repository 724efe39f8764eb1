//! Property tests for classification and scanning.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::TempDir;

use tmig::config::ScanConfig;
use tmig::core::rules::slugify;
use tmig::core::{Category, RuleSet, Scanner, classify};

fn arb_segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("sit_tests".to_string()),
        Just("tests".to_string()),
        Just("unit".to_string()),
        Just("pages".to_string()),
        Just("utils".to_string()),
        Just("data".to_string()),
        "sprint[-_]?[0-9]{1,2}(_[A-Z][a-z]{2,8}){0,2}",
        "[a-z][a-z_]{1,10}",
    ]
}

fn arb_file_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "test_[a-z_]{1,10}\\.py",
        "[a-z]{1,8}_test\\.py",
        Just("conftest.py".to_string()),
        "[a-z]{1,8}\\.(py|json|txt)",
    ]
}

/// `tests/<service>/<dirs...>/<file>`
fn arb_test_path() -> impl Strategy<Value = PathBuf> {
    (
        "[a-z][a-z_]{1,10}",
        prop::collection::vec(arb_segment(), 0..4),
        arb_file_name(),
    )
        .prop_map(|(service, dirs, file)| {
            let mut path = PathBuf::from("tests");
            path.push(service);
            path.extend(dirs);
            path.push(file);
            path
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn classification_is_deterministic(path in arb_test_path()) {
        let rules = RuleSet::builtin().unwrap();
        prop_assert_eq!(classify(&path, &rules), classify(&path, &rules));
    }

    #[test]
    fn destinations_classify_in_place(path in arb_test_path()) {
        let rules = RuleSet::builtin().unwrap();
        let first = classify(&path, &rules);
        if let Some(destination) = &first.destination {
            if destination.starts_with("tests") {
                let second = classify(destination, &rules);
                prop_assert!(second.is_in_place(), "{} -> {}", path.display(), destination.display());
            }
        } else {
            prop_assert_eq!(first.category, Category::Unclassified);
        }
    }

    #[test]
    fn destinations_are_relative_and_clean(path in arb_test_path()) {
        let rules = RuleSet::builtin().unwrap();
        if let Some(destination) = classify(&path, &rules).destination {
            prop_assert!(destination.is_relative());
            prop_assert!(!destination.components().any(|c| c.as_os_str() == ".."));
            prop_assert_eq!(destination.file_name(), path.file_name());
        }
    }

    #[test]
    fn slugify_is_idempotent(name in "[A-Za-z0-9 _\\-]{0,24}") {
        let once = slugify(&name);
        prop_assert_eq!(slugify(&once), once.clone());
        prop_assert!(!once.starts_with('_') && !once.ends_with('_'));
    }

    #[test]
    fn scanner_yields_each_matching_file_once(
        paths in prop::collection::btree_set(arb_test_path(), 1..12)
    ) {
        let dir = TempDir::new().unwrap();
        let mut written = BTreeSet::new();
        for path in &paths {
            let abs = dir.path().join(path);
            // A generated file path may collide with a generated directory.
            if fs::create_dir_all(abs.parent().unwrap()).is_err() || abs.is_dir() {
                continue;
            }
            if fs::write(&abs, "x").is_ok() {
                written.insert(path.clone());
            }
        }
        written.retain(|p| dir.path().join(p).is_file());

        let config = ScanConfig::default();
        let found: Vec<PathBuf> = Scanner::new(dir.path(), &config)
            .unwrap()
            .scan()
            .map(Result::unwrap)
            .collect();
        let found_set: BTreeSet<PathBuf> = found.iter().cloned().collect();
        prop_assert_eq!(found.len(), found_set.len());

        let expected: BTreeSet<PathBuf> = written
            .into_iter()
            .filter(|p| matches_predicate(p, &config))
            .collect();
        prop_assert_eq!(found_set, expected);
    }
}

/// Naming or location predicate, restated independently of the scanner.
fn matches_predicate(path: &Path, config: &ScanConfig) -> bool {
    let below = path.strip_prefix(&config.tests_dir).unwrap();
    let name = below.file_name().unwrap().to_string_lossy().into_owned();
    let glob_with = |patterns: &[String], text: &str, case_sensitive: bool| {
        let options = glob::MatchOptions {
            case_sensitive,
            ..glob::MatchOptions::new()
        };
        patterns
            .iter()
            .any(|p| glob::Pattern::new(p).unwrap().matches_with(text, options))
    };
    let glob = |patterns: &[String], text: &str| glob_with(patterns, text, true);
    if glob(&config.ignore_files, &name) {
        return false;
    }
    let dirs: Vec<String> = below
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if dirs.iter().any(|d| glob(&config.ignore_dirs, d)) {
        return false;
    }
    glob(&config.file_patterns, &name)
        || dirs.iter().any(|d| glob_with(&config.artifact_dirs, d, false))
}
