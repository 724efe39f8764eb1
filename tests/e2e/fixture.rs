//! E2E test fixture: an isolated project tree plus step logging.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Instant;

use assert_cmd::Command;
use tempfile::TempDir;
use tmig::core::file_digest;

/// A legacy sprint-organized suite, as found before migration.
pub const LEGACY_SUITE: &[&str] = &[
    "tests/connectx_api/conftest.py",
    "tests/connectx_api/sit_tests/conftest.py",
    "tests/connectx_api/sit_tests/test_login.py",
    "tests/connectx_api/sit_tests/test_logout.py",
    "tests/connectx_api/sit_tests/pages/login_page.py",
    "tests/connectx_api/tests/sprint-1_NetworkCoverage/test_valid_zip.py",
    "tests/connectx_api/tests/sprint-1_NetworkCoverage/test_invalid_zip.py",
    "tests/connectx_api/tests/sprint-2_Billing/invoices/test_totals.py",
    "tests/connectx_api/utils/api_client.py",
    "tests/connectx_api/data/zips.json",
    "tests/payments/unit/test_rounding.py",
];

pub struct E2EFixture {
    pub scenario_name: String,
    pub temp_dir: TempDir,
    pub root: PathBuf,
    start_time: Instant,
    step_count: usize,
}

impl E2EFixture {
    pub fn new(scenario_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {scenario_name}");
        println!("{}", "█".repeat(70));
        println!("[E2E] Root: {}", root.display());

        Self {
            scenario_name: scenario_name.to_string(),
            temp_dir,
            root,
            start_time: Instant::now(),
            step_count: 0,
        }
    }

    /// Fixture pre-populated with [`LEGACY_SUITE`].
    pub fn legacy(scenario_name: &str) -> Self {
        let fixture = Self::new(scenario_name);
        for path in LEGACY_SUITE {
            fixture.write(path, &format!("# {path}\n"));
        }
        fixture
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {description}", self.step_count);
        println!("│ Time: {:?}", self.start_time.elapsed());
        println!("└{}", "─".repeat(68));
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().expect("relative path has a parent"))
            .expect("Failed to create parent dir");
        fs::write(&path, content).expect("Failed to write fixture file");
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    /// Run the tmig binary against this root.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::cargo_bin("tmig").expect("tmig binary");
        cmd.env("XDG_CONFIG_HOME", self.root.join(".no-global-config"))
            .env_remove("TMIG_CONFIG")
            .env_remove("TMIG_TESTS_DIR")
            .env_remove("TMIG_RULES")
            .env_remove("RUST_LOG")
            .arg("-C")
            .arg(&self.root)
            .args(args);
        let output = cmd.output().expect("Failed to run tmig");

        println!("[CMD] tmig {}", args.join(" "));
        println!("[EXIT] {:?}", output.status.code());
        println!("[STDOUT]\n{}", String::from_utf8_lossy(&output.stdout));
        if !output.stderr.is_empty() {
            println!("[STDERR]\n{}", String::from_utf8_lossy(&output.stderr));
        }
        output
    }

    /// Run with `-m` and parse stdout.
    pub fn run_json(&self, args: &[&str]) -> (Output, serde_json::Value) {
        let mut full = vec!["-m"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        let json = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
        (output, json)
    }

    /// Content digest of every file below the root, keyed by relative path.
    pub fn tree_digest(&self) -> BTreeMap<PathBuf, String> {
        walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let relative = e.path().strip_prefix(&self.root).unwrap().to_path_buf();
                (relative, file_digest(e.path()).unwrap())
            })
            .collect()
    }

    /// Directories below the root, for before/after comparisons.
    pub fn dir_listing(&self) -> Vec<PathBuf> {
        walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_dir())
            .map(|e| relative(&self.root, e.path()))
            .collect()
    }
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

impl Drop for E2EFixture {
    fn drop(&mut self) {
        println!();
        println!(
            "[E2E] {} finished after {} steps in {:?}",
            self.scenario_name,
            self.step_count,
            self.start_time.elapsed()
        );
    }
}
