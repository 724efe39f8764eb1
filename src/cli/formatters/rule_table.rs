//! Effective rule table and `--explain` traces

use std::path::Path;

use console::style;
use serde::Serialize;

use super::{column_widths, display, pad};
use crate::cli::output::{
    Formattable, HumanLayout, OutputFormat, render_json_line, render_robot, robot_ok, tsv_field,
};
use crate::core::{RuleEvaluation, RuleSet, RuleSpec};

pub struct RuleTable<'a> {
    pub rules: &'a RuleSet,
}

#[derive(Serialize)]
struct RuleTableJson<'a> {
    source: String,
    count: usize,
    rules: Vec<&'a RuleSpec>,
}

impl RuleTable<'_> {
    fn rows(&self) -> Vec<[String; 5]> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let spec = rule.spec();
                [
                    (i + 1).to_string(),
                    spec.name.clone(),
                    spec.category.to_string(),
                    spec.pattern.clone(),
                    spec.destination.clone(),
                ]
            })
            .collect()
    }

    fn format_human(&self) -> String {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Classification rules ({})", self.rules.source()));

        let headers = ["#", "NAME", "CATEGORY", "PATTERN", "DESTINATION"];
        let rows = self.rows();
        let widths = column_widths(headers, &rows);
        layout.push_line(
            headers
                .iter()
                .zip(widths)
                .map(|(h, w)| pad(&style(h).bold().to_string(), w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string(),
        );
        for [index, name, category, pattern, destination] in &rows {
            layout.push_line(format!(
                "{}  {}  {}  {}  {}",
                pad(&style(index).dim().to_string(), widths[0]),
                pad(&style(name).cyan().to_string(), widths[1]),
                pad(category, widths[2]),
                pad(pattern, widths[3]),
                destination
            ));
        }
        layout.blank().push_line(format!(
            "{} rules, first match wins",
            style(self.rules.len()).bold()
        ));
        layout.build()
    }
}

impl Formattable for RuleTable<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => self.format_human(),
            OutputFormat::Json => render_robot(&robot_ok(RuleTableJson {
                source: self.rules.source().to_string(),
                count: self.rules.len(),
                rules: self.rules.iter().map(|r| r.spec()).collect(),
            })),
            OutputFormat::Jsonl => self
                .rules
                .iter()
                .map(|r| render_json_line(r.spec()))
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Plain => self
                .rows()
                .into_iter()
                .map(|[_, name, category, pattern, destination]| {
                    format!("{name} {category} {pattern} -> {destination}")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Tsv => {
                let mut out = String::from("name\tcategory\tpattern\tdestination");
                for [_, name, category, pattern, destination] in self.rows() {
                    out.push_str(&format!(
                        "\n{}\t{category}\t{}\t{}",
                        tsv_field(&name),
                        tsv_field(&pattern),
                        tsv_field(&destination)
                    ));
                }
                out
            }
        }
    }
}

/// How the rule set treats one path.
pub struct ExplainView<'a> {
    pub path: &'a Path,
    pub evaluations: &'a [RuleEvaluation],
}

#[derive(Serialize)]
struct ExplainJson<'a> {
    path: &'a Path,
    matched: Option<&'a RuleEvaluation>,
    evaluated: &'a [RuleEvaluation],
}

impl ExplainView<'_> {
    fn matched(&self) -> Option<&RuleEvaluation> {
        self.evaluations.last().filter(|e| e.destination.is_some())
    }

    fn format_human(&self) -> String {
        let mut layout = HumanLayout::new();
        layout.title(&format!("Explain {}", display(self.path)));
        for evaluation in self.evaluations {
            let marker = match (&evaluation.destination, evaluation.glob_matched) {
                (Some(_), _) => style("match").green().to_string(),
                (None, true) => style("glob only").yellow().to_string(),
                (None, false) => style("-").dim().to_string(),
            };
            layout.push_line(format!("{} {marker}", pad(&evaluation.rule, 22)));
        }
        layout.blank();
        match self.matched() {
            Some(hit) => {
                layout
                    .kv("rule", &hit.rule)
                    .kv("category", hit.category.as_str())
                    .kv(
                        "destination",
                        &hit.destination.as_deref().map(display).unwrap_or_default(),
                    );
            }
            None => {
                layout.push_line(format!(
                    "{} No rule matches; the file stays unclassified.",
                    style("!").yellow()
                ));
            }
        }
        layout.build()
    }
}

impl Formattable for ExplainView<'_> {
    fn format(&self, fmt: OutputFormat) -> String {
        match fmt {
            OutputFormat::Human => self.format_human(),
            OutputFormat::Json => render_robot(&robot_ok(ExplainJson {
                path: self.path,
                matched: self.matched(),
                evaluated: self.evaluations,
            })),
            OutputFormat::Jsonl => self
                .evaluations
                .iter()
                .map(render_json_line)
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Plain | OutputFormat::Tsv => match self.matched() {
                Some(hit) => format!(
                    "{}\t{}\t{}\t{}",
                    display(self.path),
                    hit.category,
                    hit.rule,
                    hit.destination.as_deref().map(display).unwrap_or_default()
                ),
                None => format!("{}\tunclassified\t\t", display(self.path)),
            },
        }
    }
}
