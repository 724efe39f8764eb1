//! tmig plan - Dry run
//!
//! Scans the tests directory, classifies every file and prints the
//! source → destination → category table. Never touches the filesystem.

use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::{RuleArgs, build_plan};
use crate::cli::formatters::PlanView;
use crate::core::{Category, MigrationPlan, PlanOptions};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub rules: RuleArgs,

    /// Only show moves of this category (counts stay complete)
    #[arg(long, value_enum, value_name = "CAT")]
    pub category: Option<Category>,

    /// Plan as if --allow-merge were passed to apply
    #[arg(long)]
    pub allow_merge: bool,
}

pub fn run(ctx: &AppContext, args: &PlanArgs) -> Result<()> {
    let rules = args.rules.load_rules(ctx)?;
    let options = PlanOptions {
        allow_merge: args.allow_merge || ctx.config.apply.allow_merge,
        scaffold_conftest: ctx.config.apply.scaffold_conftest,
    };
    let mut plan = build_plan(ctx, &args.rules, &rules, options)?;
    if let Some(category) = args.category {
        retain_category(&mut plan, category);
    }

    ctx.emit(&PlanView {
        plan: &plan,
        rules: rules.source(),
    });
    Ok(())
}

fn retain_category(plan: &mut MigrationPlan, category: Category) {
    plan.moves.retain(|m| m.category == category);
    plan.held.retain(|m| m.category == category);
    if category != Category::Unclassified {
        plan.unclassified.clear();
    }
}
