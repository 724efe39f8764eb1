//! Per-file apply report

use console::style;

use super::display;
use crate::cli::output::{
    Formattable, HumanLayout, OutputFormat, render_json_line, render_robot, robot_ok, robot_partial,
    tsv_field,
};
use crate::core::{ApplyReport, MoveStatus};

pub struct ApplyView<'a> {
    pub report: &'a ApplyReport,
}

impl ApplyView<'_> {
    fn format_human(&self) -> String {
        let report = self.report;
        let mut layout = HumanLayout::new();
        layout.title("Migration applied");

        for outcome in &report.outcomes {
            match &outcome.status {
                MoveStatus::Moved => layout.push_line(format!(
                    "{} {} → {}",
                    style("✓").green(),
                    display(&outcome.source),
                    style(display(&outcome.destination)).cyan()
                )),
                MoveStatus::Failed { code, message } => layout.push_line(format!(
                    "{} {} {}",
                    style("✗").red(),
                    display(&outcome.source),
                    style(format!("[{code}] {message}")).red()
                )),
            };
        }
        if report.outcomes.is_empty() {
            layout.push_line("Nothing to move.");
        }

        layout.blank().section("Summary");
        layout
            .kv("moved", &report.moved().to_string())
            .kv("failed", &report.failed().to_string())
            .kv("skipped", &report.skipped.to_string())
            .kv("dirs created", &report.directories_created.len().to_string())
            .kv("conftest", &report.scaffolded.len().to_string())
            .kv("pruned", &report.pruned.len().to_string());

        if !report.warnings.is_empty() {
            layout.blank().section("Warnings");
            for warning in &report.warnings {
                layout.bullet(warning);
            }
        }
        if !report.is_success() {
            layout.blank().section("Failed moves");
            for outcome in report.failures() {
                layout.bullet(&format!(
                    "{} -> {}",
                    display(&outcome.source),
                    display(&outcome.destination)
                ));
            }
        }
        layout.build()
    }

    fn format_plain(&self) -> String {
        self.report
            .outcomes
            .iter()
            .map(|outcome| match &outcome.status {
                MoveStatus::Moved => format!(
                    "moved {} -> {}",
                    display(&outcome.source),
                    display(&outcome.destination)
                ),
                MoveStatus::Failed { code, message } => {
                    format!("failed {} [{code}] {message}", display(&outcome.source))
                }
            })
            .chain(self.report.warnings.iter().map(|w| format!("warning: {w}")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_tsv(&self) -> String {
        let mut out = String::from("status\tsource\tdestination\tcode\tmessage");
        for outcome in &self.report.outcomes {
            let (status, code, message) = match &outcome.status {
                MoveStatus::Moved => ("moved", String::new(), String::new()),
                MoveStatus::Failed { code, message } => {
                    ("failed", code.to_string(), tsv_field(message))
                }
            };
            out.push_str(&format!(
                "\n{status}\t{}\t{}\t{code}\t{message}",
                tsv_field(&display(&outcome.source)),
                tsv_field(&display(&outcome.destination))
            ));
        }
        out
    }

    fn format_json(&self) -> String {
        let report = self.report;
        if report.is_success() {
            render_robot(&robot_ok(report).with_warnings(report.warnings.clone()))
        } else {
            render_robot(
                &robot_partial(report, report.moved(), report.failed())
                    .with_warnings(report.warnings.clone()),
            )
        }
    }
}

impl Formattable for ApplyView<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => self.format_human(),
            OutputFormat::Json => self.format_json(),
            OutputFormat::Jsonl => self
                .report
                .outcomes
                .iter()
                .map(render_json_line)
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Plain => self.format_plain(),
            OutputFormat::Tsv => self.format_tsv(),
        }
    }
}
