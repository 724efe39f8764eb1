//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::config::ScanConfig;
use crate::core::{MigrationPlan, PlanOptions, Planner, RuleSet, Scanner};
use crate::error::Result;

pub mod apply;
pub mod plan;
pub mod rules;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Plan(args) => plan::run(ctx, args),
        Commands::Apply(args) => apply::run(ctx, args),
        Commands::Rules(args) => rules::run(ctx, args),
    }
}

/// Options shared by every command that classifies files.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Rules file (TOML, `[[rule]]` tables); defaults to rules.path or the built-in rules
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Tests directory relative to the root (default: scan.tests_dir)
    #[arg(long, value_name = "DIR")]
    pub tests_dir: Option<String>,
}

impl RuleArgs {
    /// `--rules` (relative to the working directory), else `rules.path` from
    /// config (relative to the project root), else the built-in set.
    pub fn load_rules(&self, ctx: &AppContext) -> Result<RuleSet> {
        let path = self
            .rules
            .clone()
            .or_else(|| ctx.config.rules.path.as_ref().map(|p| ctx.root.join(p)));
        RuleSet::load(path.as_deref())
    }

    #[must_use]
    pub fn scan_config(&self, ctx: &AppContext) -> ScanConfig {
        let mut scan = ctx.config.scan.clone();
        if let Some(tests_dir) = &self.tests_dir {
            scan.tests_dir.clone_from(tests_dir);
        }
        scan
    }
}

/// Scan, classify and plan. Unreadable entries below the tests dir become
/// scan warnings; an unreadable tests dir is an error.
pub fn build_plan(
    ctx: &AppContext,
    args: &RuleArgs,
    rules: &RuleSet,
    options: PlanOptions,
) -> Result<MigrationPlan> {
    let scanner = Scanner::new(&ctx.root, &args.scan_config(ctx))?;
    tracing::info!(tests_dir = %scanner.tests_dir().display(), rules = %rules.source(), "scanning");

    let mut paths = Vec::new();
    let mut scan_warnings = Vec::new();
    for item in scanner.scan() {
        match item {
            Ok(path) => paths.push(path),
            Err(err) => {
                tracing::warn!(error = %err, "scan warning");
                scan_warnings.push(err.to_string());
            }
        }
    }

    let mut plan = Planner::new(&ctx.root, rules, options).plan(paths);
    plan.scan_warnings = scan_warnings;
    Ok(plan)
}
