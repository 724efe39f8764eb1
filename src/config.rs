use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TmigError};

/// File name of the project-level config, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = ".tmig.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
}

impl Config {
    /// Load config for a project root.
    ///
    /// Layers, later wins: defaults, global (`~/.config/tmig/config.toml`),
    /// project (`<root>/.tmig.toml`), then environment overrides. An explicit
    /// path (argument or `TMIG_CONFIG`) replaces the global and project layers.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("TMIG_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(TmigError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("tmig/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| TmigError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| TmigError::Config(format!("parse config {}: {err}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config layer");
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.scan {
            self.scan.merge(patch);
        }
        if let Some(patch) = patch.rules {
            self.rules.merge(patch);
        }
        if let Some(patch) = patch.apply {
            self.apply.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("TMIG_TESTS_DIR") {
            self.scan.tests_dir = value;
        }
        if let Some(value) = env_bool("TMIG_FOLLOW_LINKS") {
            self.scan.follow_links = value;
        }
        if let Some(value) = env_usize("TMIG_MAX_DEPTH")? {
            self.scan.max_depth = Some(value);
        }
        if let Some(values) = env_list("TMIG_ARTIFACT_DIRS") {
            self.scan.artifact_dirs = merge_unique(values, &self.scan.artifact_dirs);
        }
        if let Some(values) = env_list("TMIG_IGNORE_DIRS") {
            self.scan.ignore_dirs = merge_unique(values, &self.scan.ignore_dirs);
        }

        if let Some(value) = env_string("TMIG_RULES") {
            self.rules.path = Some(PathBuf::from(value));
        }

        if let Some(value) = env_bool("TMIG_ALLOW_MERGE") {
            self.apply.allow_merge = value;
        }
        if let Some(value) = env_bool("TMIG_SCAFFOLD_CONFTEST") {
            self.apply.scaffold_conftest = value;
        }
        if let Some(value) = env_bool("TMIG_PRUNE_EMPTY_DIRS") {
            self.apply.prune_empty_dirs = value;
        }
        if let Some(value) = env_bool("TMIG_VERIFY_CONTENT") {
            self.apply.verify_content = value;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Tests directory, relative to the project root.
    #[serde(default = "default_tests_dir")]
    pub tests_dir: String,
    /// File-name globs that mark a file as a test file anywhere in the tree.
    #[serde(default)]
    pub file_patterns: Vec<String>,
    /// Directory-name globs whose contents are collected regardless of name.
    #[serde(default)]
    pub artifact_dirs: Vec<String>,
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
    #[serde(default)]
    pub ignore_files: Vec<String>,
    #[serde(default = "default_true")]
    pub follow_links: bool,
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_tests_dir() -> String {
    "tests".to_string()
}

const fn default_true() -> bool {
    true
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tests_dir: default_tests_dir(),
            file_patterns: strings(&["test_*", "*_test.py", "conftest.py"]),
            artifact_dirs: strings(&[
                "sit_tests",
                "sprint*",
                "unit",
                "integration",
                "e2e",
                "pages",
                "fixtures",
                "data",
                "utils",
                "helpers",
                "reports",
            ]),
            ignore_dirs: strings(&["__pycache__", ".pytest_cache", ".git", ".venv", "node_modules"]),
            ignore_files: strings(&["*.pyc", ".DS_Store"]),
            follow_links: true,
            max_depth: None,
        }
    }
}

impl ScanConfig {
    fn merge(&mut self, patch: ScanPatch) {
        if let Some(value) = patch.tests_dir {
            self.tests_dir = value;
        }
        if let Some(values) = patch.file_patterns {
            self.file_patterns = merge_unique(values, &self.file_patterns);
        }
        if let Some(values) = patch.artifact_dirs {
            self.artifact_dirs = merge_unique(values, &self.artifact_dirs);
        }
        if let Some(values) = patch.ignore_dirs {
            self.ignore_dirs = merge_unique(values, &self.ignore_dirs);
        }
        if let Some(values) = patch.ignore_files {
            self.ignore_files = merge_unique(values, &self.ignore_files);
        }
        if let Some(value) = patch.follow_links {
            self.follow_links = value;
        }
        if let Some(value) = patch.max_depth {
            self.max_depth = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Rules file; the built-in rules are used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl RulesConfig {
    fn merge(&mut self, patch: RulesPatch) {
        if let Some(value) = patch.path {
            self.path = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    #[serde(default)]
    pub allow_merge: bool,
    #[serde(default = "default_true")]
    pub scaffold_conftest: bool,
    #[serde(default = "default_true")]
    pub prune_empty_dirs: bool,
    #[serde(default = "default_true")]
    pub verify_content: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            allow_merge: false,
            scaffold_conftest: true,
            prune_empty_dirs: true,
            verify_content: true,
        }
    }
}

impl ApplyConfig {
    fn merge(&mut self, patch: ApplyPatch) {
        if let Some(value) = patch.allow_merge {
            self.allow_merge = value;
        }
        if let Some(value) = patch.scaffold_conftest {
            self.scaffold_conftest = value;
        }
        if let Some(value) = patch.prune_empty_dirs {
            self.prune_empty_dirs = value;
        }
        if let Some(value) = patch.verify_content {
            self.verify_content = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub scan: Option<ScanPatch>,
    pub rules: Option<RulesPatch>,
    pub apply: Option<ApplyPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ScanPatch {
    pub tests_dir: Option<String>,
    pub file_patterns: Option<Vec<String>>,
    pub artifact_dirs: Option<Vec<String>>,
    pub ignore_dirs: Option<Vec<String>>,
    pub ignore_files: Option<Vec<String>>,
    pub follow_links: Option<bool>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RulesPatch {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplyPatch {
    pub allow_merge: Option<bool>,
    pub scaffold_conftest: Option<bool>,
    pub prune_empty_dirs: Option<bool>,
    pub verify_content: Option<bool>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|err| TmigError::Config(format!("{key}={value}: {err}"))),
        Err(_) => Ok(None),
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
