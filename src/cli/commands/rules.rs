//! tmig rules - Inspect the effective classification rules

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::RuleArgs;
use crate::cli::formatters::{ExplainView, RuleTable};
use crate::cli::output::{OutputFormat, emit_json, robot_ok};
use crate::core::explain;
use crate::error::{Result, TmigError};

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(flatten)]
    pub rules: RuleArgs,

    /// Show which rule classifies PATH (relative to the root) and where it goes
    #[arg(long, value_name = "PATH", conflicts_with = "export")]
    pub explain: Option<PathBuf>,

    /// Write the effective rules to FILE as a standalone rules file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Overwrite FILE when exporting
    #[arg(long, requires = "export")]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &RulesArgs) -> Result<()> {
    let rules = args.rules.load_rules(ctx)?;

    if let Some(path) = &args.explain {
        let evaluations = explain(path, &rules);
        ctx.emit(&ExplainView {
            path,
            evaluations: &evaluations,
        });
        return Ok(());
    }

    if let Some(target) = &args.export {
        let toml = rules.to_toml()?;
        let mut options = OpenOptions::new();
        options.write(true);
        if args.force {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut file = options.open(target).map_err(|err| match err.kind() {
            std::io::ErrorKind::AlreadyExists => TmigError::Config(format!(
                "{} already exists (use --force to overwrite)",
                target.display()
            )),
            _ => TmigError::from_io(err, target),
        })?;
        file.write_all(toml.as_bytes())?;
        tracing::info!(path = %target.display(), count = rules.len(), "exported rules");

        if ctx.output_format.is_json() {
            emit_json(&robot_ok(serde_json::json!({
                "exported": target,
                "count": rules.len(),
            })))?;
        } else if ctx.output_format != OutputFormat::Tsv && ctx.shows_reports() {
            println!("Exported {} rules to {}", rules.len(), target.display());
        }
        return Ok(());
    }

    ctx.emit(&RuleTable { rules: &rules });
    Ok(())
}
