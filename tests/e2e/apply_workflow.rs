//! E2E Scenario: applying a migration
//!
//! - Content survives every move (hash round trip)
//! - Sources disappear, emptied legacy directories are pruned
//! - Re-planning after apply is a no-op

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::fixture::E2EFixture;

#[test]
fn test_apply_round_trips_content() {
    let mut fixture = E2EFixture::legacy("apply_round_trips_content");

    fixture.log_step("Plan and remember each source digest");
    let (_, plan) = fixture.run_json(&["plan"]);
    let before = fixture.tree_digest();
    let expected: BTreeMap<PathBuf, String> = plan["data"]["moves"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            let source = PathBuf::from(m["source"].as_str().unwrap());
            let destination = PathBuf::from(m["destination"].as_str().unwrap());
            (destination, before[&source].clone())
        })
        .collect();
    assert_eq!(expected.len(), 11);

    fixture.log_step("Apply");
    let (output, report) = fixture.run_json(&["apply"]);
    assert!(output.status.success());
    assert_eq!(report["status"], "ok");
    assert_eq!(report["data"]["outcomes"].as_array().unwrap().len(), 11);

    fixture.log_step("Verify destinations and sources");
    let after = fixture.tree_digest();
    for (destination, digest) in &expected {
        assert_eq!(after.get(destination), Some(digest), "{}", destination.display());
    }
    for m in plan["data"]["moves"].as_array().unwrap() {
        assert!(!fixture.exists(m["source"].as_str().unwrap()));
    }
    assert!(!fixture.exists("tests/connectx_api"));
    assert!(!fixture.exists("tests/payments"));
    assert!(fixture.exists("tests/e2e/conftest.py"));
    assert!(fixture.exists("tests/integration/conftest.py"));
    assert!(fixture.exists("tests/unit/conftest.py"));
}

#[test]
fn test_replan_after_apply_is_noop() {
    let mut fixture = E2EFixture::legacy("replan_after_apply_is_noop");

    fixture.log_step("Apply");
    assert!(fixture.run(&["apply"]).status.success());
    let after_apply = fixture.tree_digest();

    fixture.log_step("Plan again");
    let (output, json) = fixture.run_json(&["plan"]);
    assert!(output.status.success());
    assert!(json["data"]["moves"].as_array().unwrap().is_empty());
    assert!(json["data"]["scaffolds"].as_array().unwrap().is_empty());
    assert!(json["data"]["unclassified"].as_array().unwrap().is_empty());
    assert_eq!(
        json["data"]["in_place"].as_array().unwrap().len(),
        after_apply.len()
    );

    fixture.log_step("Apply again changes nothing");
    assert!(fixture.run(&["apply"]).status.success());
    assert_eq!(fixture.tree_digest(), after_apply);
}

#[test]
fn test_apply_refuses_to_overwrite_existing_destination() {
    let mut fixture = E2EFixture::new("apply_refuses_to_overwrite_existing_destination");
    fixture.write("tests/connectx_api/sit_tests/test_login.py", "legacy");
    fixture.write("tests/e2e/connectx_api/ui/test_login.py", "already migrated");

    fixture.log_step("Apply");
    let output = fixture.run(&["--plain", "apply"]);
    assert!(output.status.success());

    fixture.log_step("Both copies survive");
    let digests = fixture.tree_digest();
    assert_eq!(digests.len(), 2);
    assert!(fixture.exists("tests/connectx_api/sit_tests/test_login.py"));
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("tests/e2e/connectx_api/ui/test_login.py"))
            .unwrap(),
        "already migrated"
    );
}

#[test]
fn test_apply_tsv_report() {
    let mut fixture = E2EFixture::new("apply_tsv_report");
    fixture.write("tests/billing/unit/test_tax.py", "tax");

    fixture.log_step("Apply with TSV output");
    let output = fixture.run(&["-O", "tsv", "apply", "--no-verify"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("status\tsource\tdestination\tcode\tmessage"));
    assert_eq!(
        lines.next(),
        Some("moved\ttests/billing/unit/test_tax.py\ttests/unit/billing/test_tax.py\t\t")
    );
}
