//! tmig - test-suite migration CLI
//!
//! Classify a sprint-organized test suite and move it into a
//! category-based layout.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tmig::app::AppContext;
use tmig::cli::output::{emit_robot, robot_error_structured};
use tmig::cli::{Cli, OutputFormat};
use tmig::{Result, TmigError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    init_colors(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, cli.output_format());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    tmig::cli::commands::run(&ctx, &cli.command)
}

fn report_error(e: &TmigError, format: OutputFormat) {
    if format.is_json() {
        // A partial apply already printed its report with a partial status.
        if matches!(e, TmigError::PartialApply { .. }) {
            return;
        }
        if emit_robot(&robot_error_structured(e), format).is_ok() {
            return;
        }
    }
    let structured = e.to_structured();
    eprintln!("Error: {e}");
    eprintln!("Hint: {}", structured.suggestion);
}

fn init_colors(cli: &Cli) {
    if cli.force_plain() || !cli.output_format().use_colors() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    } else if cli.force_rich() {
        console::set_colors_enabled(true);
        console::set_colors_enabled_stderr(true);
    }
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,tmig=info",
        1 => "info,tmig=debug",
        2 => "debug,tmig=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.output_format().is_machine_readable() {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(!cli.force_plain())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
