//! tmig apply - Perform the migration
//!
//! Re-plans from the current tree, then moves every planned file. Failures
//! are reported per file and do not stop the remaining moves; any failure
//! turns the exit code to 2.

use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::{RuleArgs, build_plan};
use crate::cli::formatters::ApplyView;
use crate::core::{ApplyOptions, Executor, PlanOptions};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub rules: RuleArgs,

    /// Move files out of differently-spelled directories into one destination
    #[arg(long)]
    pub allow_merge: bool,

    /// Do not write conftest.py stubs into new category directories
    #[arg(long)]
    pub no_scaffold: bool,

    /// Keep source directories left empty by the migration
    #[arg(long)]
    pub no_prune: bool,

    /// Skip the SHA-256 comparison around each move
    #[arg(long)]
    pub no_verify: bool,
}

impl ApplyArgs {
    fn plan_options(&self, ctx: &AppContext) -> PlanOptions {
        PlanOptions {
            allow_merge: self.allow_merge || ctx.config.apply.allow_merge,
            scaffold_conftest: !self.no_scaffold && ctx.config.apply.scaffold_conftest,
        }
    }

    fn apply_options(&self, ctx: &AppContext) -> ApplyOptions {
        ApplyOptions {
            verify_content: !self.no_verify && ctx.config.apply.verify_content,
            prune_empty_dirs: !self.no_prune && ctx.config.apply.prune_empty_dirs,
        }
    }
}

pub fn run(ctx: &AppContext, args: &ApplyArgs) -> Result<()> {
    let rules = args.rules.load_rules(ctx)?;
    let plan = build_plan(ctx, &args.rules, &rules, args.plan_options(ctx))?;

    for warning in plan.review_errors() {
        tracing::warn!(code = %warning.code(), "{warning}");
    }

    let tests_dir = args.rules.scan_config(ctx).tests_dir;
    let report = Executor::new(&ctx.root, tests_dir, args.apply_options(ctx)).execute(&plan);

    ctx.emit(&ApplyView { report: &report });
    report.into_result().map(|_| ())
}
