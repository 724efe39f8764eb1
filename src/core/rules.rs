//! Classification rules: glob patterns mapped to categories and destination templates.
//!
//! Rules are evaluated in order and the first rule whose pattern matches and
//! whose destination template fully resolves wins. Paths are compared as
//! `/`-separated strings relative to the project root; `*` never crosses a
//! separator and `**` spans any number of directories.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::category::Category;
use crate::error::{Result, TmigError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

const MATCH_OPTIONS_IGNORE_CASE: MatchOptions = MatchOptions {
    case_sensitive: false,
    ..MATCH_OPTIONS
};

static SPRINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^sprint[-_ ]?(\d+)[-_ ]*(.*)$").expect("valid sprint regex")
});

/// Serialized form of a rule, as written in a rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    pub category: Category,
    pub destination: String,
    /// Match the pattern without regard to ASCII case (`Sprint6_Login`).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_case: bool,
}

impl RuleSpec {
    fn new(name: &str, pattern: &str, category: Category, destination: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            category,
            destination: destination.to_string(),
            ignore_case: false,
        }
    }

    fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// Values a destination template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    TestsDir,
    Service,
    Feature,
    Sprint,
    Parent,
    File,
    Stem,
    Rest,
    Path,
}

impl Placeholder {
    const ALL: [Self; 9] = [
        Self::TestsDir,
        Self::Service,
        Self::Feature,
        Self::Sprint,
        Self::Parent,
        Self::File,
        Self::Stem,
        Self::Rest,
        Self::Path,
    ];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TestsDir => "tests_dir",
            Self::Service => "service",
            Self::Feature => "feature",
            Self::Sprint => "sprint",
            Self::Parent => "parent",
            Self::File => "file",
            Self::Stem => "stem",
            Self::Rest => "rest",
            Self::Path => "path",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

impl FromStr for Placeholder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown placeholder {{{s}}}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Placeholder(Placeholder),
}

/// A validated, compiled classification rule.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    spec: RuleSpec,
    pattern: Pattern,
    template: Vec<Token>,
    /// Index of the pattern's first `**` segment; `{rest}` starts there.
    rest_start: Option<usize>,
}

impl ClassificationRule {
    pub fn new(spec: RuleSpec) -> Result<Self> {
        let invalid = |reason: String| TmigError::InvalidRule {
            rule: spec.name.clone(),
            reason,
        };

        if spec.name.trim().is_empty() {
            return Err(invalid("rule name is empty".to_string()));
        }
        if spec.category == Category::Unclassified {
            return Err(invalid(
                "category 'unclassified' is reserved for files no rule matches".to_string(),
            ));
        }

        let pattern = Pattern::new(&spec.pattern)
            .map_err(|err| invalid(format!("pattern '{}': {err}", spec.pattern)))?;
        let template = parse_template(&spec.destination).map_err(invalid)?;
        let rest_start = spec.pattern.split('/').position(|segment| segment == "**");

        Ok(Self {
            spec,
            pattern,
            template,
            rest_start,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        self.spec.category
    }

    #[must_use]
    pub const fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    const fn match_options(&self) -> MatchOptions {
        if self.spec.ignore_case {
            MATCH_OPTIONS_IGNORE_CASE
        } else {
            MATCH_OPTIONS
        }
    }

    /// Whether the glob pattern alone matches `path`.
    #[must_use]
    pub fn matches_glob(&self, path: &Path) -> bool {
        let segments = path_segments(path);
        self.pattern.matches_with(&segments.join("/"), self.match_options())
    }

    /// Destination for `path`, or `None` when the pattern does not match or a
    /// placeholder has no value for this path.
    #[must_use]
    pub fn destination_for(&self, path: &Path) -> Option<PathBuf> {
        let segments = path_segments(path);
        if segments.is_empty()
            || !self
                .pattern
                .matches_with(&segments.join("/"), self.match_options())
        {
            return None;
        }
        self.render(&segments)
    }

    fn render(&self, segments: &[String]) -> Option<PathBuf> {
        let mut out = String::new();
        for token in &self.template {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Placeholder(placeholder) => {
                    out.push_str(&self.resolve(*placeholder, segments)?);
                }
            }
        }
        if out.split('/').any(str::is_empty) {
            return None;
        }
        Some(PathBuf::from(out))
    }

    fn resolve(&self, placeholder: Placeholder, segments: &[String]) -> Option<String> {
        let len = segments.len();
        let file = segments.last()?;
        let value = match placeholder {
            Placeholder::TestsDir => (len >= 2).then(|| segments[0].clone()),
            Placeholder::Service => (len >= 3).then(|| segments[1].clone()),
            Placeholder::Feature => feature_slug(segments),
            Placeholder::Sprint => sprint_segment(segments).map(|(number, _)| number),
            Placeholder::Parent => (len >= 2).then(|| segments[len - 2].clone()),
            Placeholder::File => Some(file.clone()),
            Placeholder::Stem => Path::new(file)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
            Placeholder::Rest => match self.rest_start {
                Some(start) if start < len => Some(segments[start..].join("/")),
                Some(_) => None,
                None => Some(file.clone()),
            },
            Placeholder::Path => Some(segments.join("/")),
        };
        value.filter(|v| !v.is_empty())
    }
}

fn parse_template(template: &str) -> std::result::Result<Vec<Token>, String> {
    if template.trim().is_empty() {
        return Err("destination template is empty".to_string());
    }
    if template.starts_with('/') || template.starts_with('\\') {
        return Err(format!("destination '{template}' must be relative"));
    }
    if template.split('/').any(|segment| segment == "..") {
        return Err(format!("destination '{template}' must not contain '..'"));
    }

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(format!("unclosed '{{' in '{template}'")),
                    }
                }
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Placeholder(name.trim().parse()?));
            }
            '}' => return Err(format!("unmatched '}}' in '{template}'")),
            _ => literal.push(c),
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Normal path components as strings.
#[must_use]
pub fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// `(number, remainder)` of a directory named like a sprint, in any case.
fn sprint_parts(segment: &str) -> Option<(String, String)> {
    SPRINT_RE.captures(segment).map(|caps| {
        (
            caps[1].to_string(),
            caps.get(2).map_or_else(String::new, |m| m.as_str().to_string()),
        )
    })
}

/// First directory segment named like a sprint.
fn sprint_segment(segments: &[String]) -> Option<(String, String)> {
    let dirs = &segments[..segments.len().saturating_sub(1)];
    dirs.iter().find_map(|segment| sprint_parts(segment))
}

/// Spelling-insensitive form of a directory name. `sprint-6`, `sprint_6`,
/// `sprint6` and `Sprint-06` share one key; other names compare by slug.
#[must_use]
pub fn normalized_dir_name(segment: &str) -> String {
    match sprint_parts(segment) {
        Some((number, remainder)) => {
            let number = number.trim_start_matches('0');
            format!(
                "sprint {} {}",
                if number.is_empty() { "0" } else { number },
                slugify(&remainder)
            )
        }
        None => slugify(segment),
    }
}

fn feature_slug(segments: &[String]) -> Option<String> {
    if let Some((number, name)) = sprint_segment(segments) {
        let slug = slugify(&name);
        return Some(if slug.is_empty() {
            format!("sprint_{number}")
        } else {
            slug
        });
    }
    let len = segments.len();
    (len >= 2).then(|| slugify(&segments[len - 2]))
}

/// Lowercase snake_case slug: `NetworkCoverage` -> `network_coverage`,
/// `APITests` -> `api_tests`, `sprint-6` -> `sprint_6`.
#[must_use]
pub fn slugify(name: &str) -> String {
    fn push_separator(out: &mut String) {
        if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }

    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            push_separator(&mut out);
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                push_separator(&mut out);
            }
        }
        out.extend(c.to_lowercase());
    }
    out.trim_end_matches('_').to_string()
}

/// Rules file layout: `[[rule]]` tables, optionally ahead of the built-ins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RulesFile {
    #[serde(default)]
    extend_builtin: bool,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

/// Where a rule set came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum RuleSource {
    Builtin,
    File(PathBuf),
    /// A file whose rules precede the built-in ones.
    Extended(PathBuf),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("built-in"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Extended(path) => write!(f, "{} + built-in", path.display()),
        }
    }
}

/// Ordered list of rules. Order is significant: first match wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
    source: RuleSource,
}

impl RuleSet {
    /// The default rules for the sprint-based to feature-based migration.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            rules: Self::compile(builtin_specs())?,
            source: RuleSource::Builtin,
        })
    }

    /// Rules from `path` when given, the built-in set otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => TmigError::RulesNotFound(path.to_path_buf()),
            _ => TmigError::from_io(err, path),
        })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self> {
        let file: RulesFile = toml::from_str(raw)
            .map_err(|err| TmigError::Config(format!("parse rules {}: {err}", origin.display())))?;

        if file.rules.is_empty() && !file.extend_builtin {
            return Err(TmigError::Config(format!(
                "rules file {} defines no [[rule]] entries",
                origin.display()
            )));
        }

        let mut specs = file.rules;
        let source = if file.extend_builtin {
            specs.extend(builtin_specs());
            RuleSource::Extended(origin.to_path_buf())
        } else {
            RuleSource::File(origin.to_path_buf())
        };

        let rules = Self::compile(specs)?;
        tracing::debug!(count = rules.len(), source = %source, "loaded classification rules");
        Ok(Self { rules, source })
    }

    fn compile(specs: Vec<RuleSpec>) -> Result<Vec<ClassificationRule>> {
        let mut seen = std::collections::HashSet::new();
        let mut rules = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.name.clone()) {
                return Err(TmigError::InvalidRule {
                    rule: spec.name,
                    reason: "duplicate rule name".to_string(),
                });
            }
            rules.push(ClassificationRule::new(spec)?);
        }
        Ok(rules)
    }

    /// Serialize as a standalone rules file.
    pub fn to_toml(&self) -> Result<String> {
        let file = RulesFile {
            extend_builtin: false,
            rules: self.rules.iter().map(|rule| rule.spec.clone()).collect(),
        };
        toml::to_string_pretty(&file).map_err(|err| TmigError::Serialization(err.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassificationRule> {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub const fn source(&self) -> &RuleSource {
        &self.source
    }
}

fn builtin_specs() -> Vec<RuleSpec> {
    use Category::{E2e, Fixture, Helper, Integration, Report, Unit};

    vec![
        // Already in the target layout: stays where it is.
        RuleSpec::new("migrated-unit", "*/unit/**/*", Unit, "{path}"),
        RuleSpec::new("migrated-integration", "*/integration/**/*", Integration, "{path}"),
        RuleSpec::new("migrated-e2e", "*/e2e/**/*", E2e, "{path}"),
        RuleSpec::new("migrated-fixtures", "*/fixtures/**/*", Fixture, "{path}"),
        RuleSpec::new("migrated-helpers", "*/helpers/**/*", Helper, "{path}"),
        // System integration (browser) suites.
        RuleSpec::new(
            "sit-page-objects",
            "*/*/sit_tests/**/pages/**/*",
            Helper,
            "{tests_dir}/e2e/{service}/{rest}",
        ),
        RuleSpec::new(
            "sit-conftest",
            "*/*/sit_tests/**/conftest.py",
            Fixture,
            "{tests_dir}/e2e/{service}/{rest}",
        ),
        RuleSpec::new(
            "sit-tests",
            "*/*/sit_tests/**/*",
            E2e,
            "{tests_dir}/e2e/{service}/ui/{rest}",
        ),
        // Sprint folders regroup by feature whatever their casing.
        RuleSpec::new(
            "sprint-conftest",
            "*/*/tests/sprint*/**/conftest.py",
            Fixture,
            "{tests_dir}/integration/{service}/{feature}/{rest}",
        )
        .ignoring_case(),
        RuleSpec::new(
            "sprint-tests",
            "*/*/tests/sprint*/**/*",
            Integration,
            "{tests_dir}/integration/{service}/{feature}/{rest}",
        )
        .ignoring_case(),
        RuleSpec::new("unit-tests", "*/*/unit/**/*", Unit, "{tests_dir}/unit/{service}/{rest}"),
        RuleSpec::new(
            "fixtures",
            "*/*/fixtures/**/*",
            Fixture,
            "{tests_dir}/fixtures/{service}/{rest}",
        ),
        RuleSpec::new(
            "test-data",
            "*/*/data/**/*",
            Fixture,
            "{tests_dir}/fixtures/{service}/data/{rest}",
        ),
        RuleSpec::new("helpers", "*/*/utils/**/*", Helper, "{tests_dir}/helpers/{service}/{rest}"),
        RuleSpec::new("reports", "*/*/reports/**/*", Report, "reports/{service}/{rest}"),
        RuleSpec::new(
            "service-conftest",
            "*/*/conftest.py",
            Fixture,
            "{tests_dir}/fixtures/{service}/conftest.py",
        ),
        RuleSpec::new(
            "api-tests",
            "*/*/tests/**/test_*.py",
            Integration,
            "{tests_dir}/integration/{service}/{rest}",
        ),
    ]
}
