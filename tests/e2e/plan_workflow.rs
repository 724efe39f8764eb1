//! E2E Scenario: dry-run planning over a legacy suite
//!
//! - Every file lands in the expected category and destination
//! - Planning never changes the tree
//! - Differently-spelled sprint directories are held for review, at any depth

use super::fixture::E2EFixture;

#[test]
fn test_plan_classifies_legacy_suite() {
    let mut fixture = E2EFixture::legacy("plan_classifies_legacy_suite");

    fixture.log_step("Plan in JSON mode");
    let (output, json) = fixture.run_json(&["plan"]);
    assert!(output.status.success());

    let moves = json["data"]["moves"].as_array().unwrap();
    let destination_of = |source: &str| {
        moves
            .iter()
            .find(|m| m["source"] == source)
            .map(|m| (m["category"].as_str().unwrap(), m["destination"].as_str().unwrap()))
    };

    assert_eq!(
        destination_of("tests/connectx_api/sit_tests/test_login.py"),
        Some(("e2e", "tests/e2e/connectx_api/ui/test_login.py"))
    );
    assert_eq!(
        destination_of("tests/connectx_api/tests/sprint-1_NetworkCoverage/test_valid_zip.py"),
        Some((
            "integration",
            "tests/integration/connectx_api/network_coverage/test_valid_zip.py"
        ))
    );
    assert_eq!(
        destination_of("tests/connectx_api/tests/sprint-2_Billing/invoices/test_totals.py"),
        Some((
            "integration",
            "tests/integration/connectx_api/billing/invoices/test_totals.py"
        ))
    );
    assert_eq!(
        destination_of("tests/connectx_api/sit_tests/pages/login_page.py"),
        Some(("helper", "tests/e2e/connectx_api/pages/login_page.py"))
    );
    assert_eq!(
        destination_of("tests/connectx_api/conftest.py"),
        Some(("fixture", "tests/fixtures/connectx_api/conftest.py"))
    );
    assert_eq!(
        destination_of("tests/payments/unit/test_rounding.py"),
        Some(("unit", "tests/unit/payments/test_rounding.py"))
    );

    fixture.log_step("Check counts and review lists");
    assert_eq!(json["data"]["counts"]["e2e"], 2);
    assert_eq!(json["data"]["counts"]["integration"], 3);
    assert!(json["data"]["collisions"].as_array().unwrap().is_empty());
    assert!(json["data"]["unclassified"].as_array().unwrap().is_empty());
    let scaffolds = json["data"]["scaffolds"].as_array().unwrap();
    assert_eq!(scaffolds.len(), 3);
}

#[test]
fn test_plan_never_mutates_tree() {
    let mut fixture = E2EFixture::legacy("plan_never_mutates_tree");

    fixture.log_step("Snapshot tree");
    let files_before = fixture.tree_digest();
    let dirs_before = fixture.dir_listing();

    fixture.log_step("Plan in every output format");
    for format in ["human", "json", "jsonl", "plain", "tsv"] {
        let output = fixture.run(&["-O", format, "plan"]);
        assert!(output.status.success(), "plan -O {format}");
    }

    fixture.log_step("Compare");
    assert_eq!(fixture.tree_digest(), files_before);
    assert_eq!(fixture.dir_listing(), dirs_before);
}

#[test]
fn test_plan_holds_differently_spelled_sprints() {
    let mut fixture = E2EFixture::new("plan_holds_differently_spelled_sprints");
    fixture.write("tests/connectx_api/tests/sprint-6/test_a.py", "a");
    fixture.write("tests/connectx_api/tests/sprint_6/test_b.py", "b");
    fixture.write("tests/connectx_api/sit_tests/test_login.py", "login");

    fixture.log_step("Plan");
    let (_, json) = fixture.run_json(&["plan"]);
    let merges = json["data"]["merges"].as_array().unwrap();
    assert_eq!(merges.len(), 1);
    assert_eq!(
        merges[0]["destination"],
        "tests/integration/connectx_api/sprint_6"
    );
    assert_eq!(json["data"]["held"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["moves"].as_array().unwrap().len(), 1);
    assert!(
        json["warnings"]
            .as_array()
            .unwrap()
            .iter()
            .any(|w| w.as_str().unwrap().contains("merge"))
    );

    fixture.log_step("Apply without --allow-merge keeps both sprint dirs");
    let output = fixture.run(&["apply"]);
    assert!(output.status.success());
    assert!(fixture.exists("tests/connectx_api/tests/sprint-6/test_a.py"));
    assert!(fixture.exists("tests/connectx_api/tests/sprint_6/test_b.py"));
    assert!(fixture.exists("tests/e2e/connectx_api/ui/test_login.py"));

    fixture.log_step("Apply with --allow-merge");
    let output = fixture.run(&["apply", "--allow-merge"]);
    assert!(output.status.success());
    assert!(fixture.exists("tests/integration/connectx_api/sprint_6/test_a.py"));
    assert!(fixture.exists("tests/integration/connectx_api/sprint_6/test_b.py"));
}

#[test]
fn test_plan_holds_nested_and_recased_sprint_dirs() {
    let mut fixture = E2EFixture::new("plan_holds_nested_and_recased_sprint_dirs");
    fixture.write("tests/connectx_api/tests/sprint6/sub/test_a.py", "a");
    fixture.write("tests/connectx_api/tests/Sprint-6/sub/test_b.py", "b");
    fixture.write("tests/connectx_api/tests/sprint-7_Login/test_c.py", "c");
    fixture.write("tests/connectx_api/tests/Sprint7_Login/test_d.py", "d");

    fixture.log_step("Plan");
    let (output, json) = fixture.run_json(&["plan"]);
    assert!(output.status.success());
    let mut destinations: Vec<&str> = json["data"]["merges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["destination"].as_str().unwrap())
        .collect();
    destinations.sort_unstable();
    assert_eq!(
        destinations,
        vec![
            "tests/integration/connectx_api/login",
            "tests/integration/connectx_api/sprint_6",
        ]
    );
    assert_eq!(json["data"]["held"].as_array().unwrap().len(), 4);
    assert!(json["data"]["moves"].as_array().unwrap().is_empty());

    fixture.log_step("Apply keeps every held file in place");
    let before = fixture.tree_digest();
    let output = fixture.run(&["apply"]);
    assert!(output.status.success());
    assert_eq!(fixture.tree_digest(), before);
}

#[test]
fn test_plan_reports_collisions_without_failing() {
    let mut fixture = E2EFixture::new("plan_reports_collisions_without_failing");
    fixture.write("tests/connectx_api/tests/sprint-1_Billing/test_invoice.py", "one");
    fixture.write("tests/connectx_api/tests/sprint-4_Billing/test_invoice.py", "two");

    fixture.log_step("Plan (plain)");
    let output = fixture.run(&["--plain", "plan"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("warning: Destination collision"));
    assert!(stdout.contains("tests/integration/connectx_api/billing/test_invoice.py"));

    fixture.log_step("Apply leaves both sources in place");
    let before = fixture.tree_digest();
    let output = fixture.run(&["apply"]);
    assert!(output.status.success());
    assert_eq!(fixture.tree_digest(), before);
}
