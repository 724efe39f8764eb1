//! Dry-run report: source -> destination -> category

use console::style;
use serde::Serialize;

use super::{column_widths, display, pad};
use crate::cli::output::{
    Formattable, HumanLayout, OutputFormat, render_json_line, render_robot, robot_ok, tsv_field,
};
use crate::core::{MigrationPlan, RuleSource};

/// A plan plus where its rules came from.
pub struct PlanView<'a> {
    pub plan: &'a MigrationPlan,
    pub rules: &'a RuleSource,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    rules: &'a RuleSource,
    #[serde(flatten)]
    plan: &'a MigrationPlan,
}

impl PlanView<'_> {
    /// Review items and scan problems as one-line warnings.
    fn warnings(&self) -> Vec<String> {
        self.plan
            .scan_warnings
            .iter()
            .cloned()
            .chain(self.plan.review_errors().iter().map(ToString::to_string))
            .collect()
    }

    fn format_human(&self) -> String {
        let plan = self.plan;
        let mut layout = HumanLayout::new();
        layout.title("Migration plan (dry run)");

        if plan.moves.is_empty() {
            layout.push_line(format!("{} Nothing to move.", style("✓").green()));
        } else {
            let rows: Vec<[String; 3]> = plan
                .moves
                .iter()
                .map(|m| {
                    [
                        display(&m.source),
                        display(&m.destination),
                        m.category.to_string(),
                    ]
                })
                .collect();
            let headers = ["SOURCE", "DESTINATION", "CATEGORY"];
            let widths = column_widths(headers, &rows);
            layout.push_line(format!(
                "{}  {}  {}",
                pad(&style(headers[0]).bold().to_string(), widths[0]),
                pad(&style(headers[1]).bold().to_string(), widths[1]),
                style(headers[2]).bold()
            ));
            for [source, destination, category] in &rows {
                layout.push_line(format!(
                    "{}  {}  {}",
                    pad(source, widths[0]),
                    pad(&style(destination).cyan().to_string(), widths[1]),
                    style(category).dim()
                ));
            }
        }

        layout.blank().section("Files per category");
        for (category, count) in &plan.counts {
            layout.kv(category.as_str(), &count.to_string());
        }
        layout.kv("total", &plan.total_files().to_string());

        if plan.review_count() > 0 || !plan.scan_warnings.is_empty() {
            layout.blank().section("Needs review");
            for collision in &plan.collisions {
                let reason = if collision.existing { "already exists" } else { "shared by" };
                layout.bullet(&format!(
                    "{} {} {reason} {}",
                    style("collision").red(),
                    display(&collision.destination),
                    collision
                        .sources
                        .iter()
                        .map(|p| display(p))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            for merge in &plan.merges {
                layout.bullet(&format!(
                    "{} {} <- {}",
                    style("merge").yellow(),
                    display(&merge.destination),
                    merge
                        .sources
                        .iter()
                        .map(|p| display(p))
                        .collect::<Vec<_>>()
                        .join(" + ")
                ));
            }
            for path in &plan.unclassified {
                layout.bullet(&format!("{} {}", style("unclassified").yellow(), display(path)));
            }
            for warning in &plan.scan_warnings {
                layout.bullet(&format!("{} {warning}", style("scan").red()));
            }
        }

        layout.blank().push_line(format!(
            "{} moves, {} directories to create, {} conftest stubs, {} held, {} in place ({} rules)",
            style(plan.moves.len()).bold(),
            plan.directories.len(),
            plan.scaffolds.len(),
            plan.held.len(),
            plan.in_place.len(),
            self.rules
        ));
        layout.build()
    }

    fn format_plain(&self) -> String {
        let plan = self.plan;
        let mut lines: Vec<String> = plan
            .moves
            .iter()
            .map(|m| {
                format!(
                    "{} -> {} ({})",
                    display(&m.source),
                    display(&m.destination),
                    m.category
                )
            })
            .collect();
        lines.extend(
            plan.counts
                .iter()
                .map(|(category, count)| format!("{category}: {count}")),
        );
        lines.extend(self.warnings().into_iter().map(|w| format!("warning: {w}")));
        lines.join("\n")
    }

    fn format_tsv(&self) -> String {
        let plan = self.plan;
        let mut out = String::from("status\tsource\tdestination\tcategory\trule\n");
        let mut row = |status: &str, source: &str, destination: &str, category: &str, rule: &str| {
            out.push_str(&format!(
                "{status}\t{}\t{}\t{category}\t{}\n",
                tsv_field(source),
                tsv_field(destination),
                tsv_field(rule)
            ));
        };
        for m in &plan.moves {
            row("move", &display(&m.source), &display(&m.destination), m.category.as_str(), &m.rule);
        }
        for m in &plan.held {
            row("held", &display(&m.source), &display(&m.destination), m.category.as_str(), &m.rule);
        }
        for collision in &plan.collisions {
            for source in &collision.sources {
                row("collision", &display(source), &display(&collision.destination), "", "");
            }
        }
        for path in &plan.unclassified {
            row("unclassified", &display(path), "", "unclassified", "");
        }
        for path in &plan.in_place {
            row("in_place", &display(path), &display(path), "", "");
        }
        out.truncate(out.trim_end_matches('\n').len());
        out
    }

    fn format_jsonl(&self) -> String {
        self.plan
            .moves
            .iter()
            .map(render_json_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Formattable for PlanView<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => self.format_human(),
            OutputFormat::Json => {
                let response = robot_ok(PlanJson {
                    rules: self.rules,
                    plan: self.plan,
                })
                .with_warnings(self.warnings());
                render_robot(&response)
            }
            OutputFormat::Jsonl => self.format_jsonl(),
            OutputFormat::Plain => self.format_plain(),
            OutputFormat::Tsv => self.format_tsv(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlanOptions, Planner, RuleSet};
    use std::path::{Path, PathBuf};

    fn sample_plan() -> MigrationPlan {
        let rules = RuleSet::builtin().unwrap();
        Planner::new(Path::new("/nonexistent-root"), &rules, PlanOptions::default()).plan(
            [
                "tests/svc/sit_tests/test_login.py",
                "tests/svc/tests/sprint-1_NetworkCoverage/test_valid_zip.py",
                "tests/svc/misc/notes.py",
            ]
            .into_iter()
            .map(PathBuf::from),
        )
    }

    #[test]
    fn human_lists_each_move_and_counts() {
        let plan = sample_plan();
        let view = PlanView {
            plan: &plan,
            rules: &RuleSource::Builtin,
        };
        let out = console::strip_ansi_codes(&view.format(OutputFormat::Human)).to_string();
        assert!(out.contains("tests/svc/sit_tests/test_login.py"));
        assert!(out.contains("tests/e2e/svc/ui/test_login.py"));
        assert!(out.contains("integration"));
        assert!(out.contains("unclassified tests/svc/misc/notes.py"));
        assert!(out.contains("2 moves"));
    }

    #[test]
    fn json_wraps_plan_with_warnings() {
        let plan = sample_plan();
        let view = PlanView {
            plan: &plan,
            rules: &RuleSource::Builtin,
        };
        let json: serde_json::Value =
            serde_json::from_str(&view.format(OutputFormat::Json)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["moves"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"]["counts"]["e2e"], 1);
        assert!(json["warnings"][0].as_str().unwrap().contains("notes.py"));
    }

    #[test]
    fn jsonl_has_one_record_per_move() {
        let plan = sample_plan();
        let view = PlanView {
            plan: &plan,
            rules: &RuleSource::Builtin,
        };
        let out = view.format(OutputFormat::Jsonl);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(record["destination"].is_string());
        }
    }

    #[test]
    fn tsv_marks_row_status() {
        let plan = sample_plan();
        let view = PlanView {
            plan: &plan,
            rules: &RuleSource::Builtin,
        };
        let out = view.format(OutputFormat::Tsv);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("status\tsource\tdestination\tcategory\trule"));
        assert_eq!(out.lines().filter(|l| l.starts_with("move\t")).count(), 2);
        assert!(out.lines().any(|l| l.starts_with("unclassified\ttests/svc/misc/notes.py")));
    }
}
