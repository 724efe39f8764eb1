//! Output formatters for CLI commands
//!
//! Each report renders to every [`OutputFormat`](crate::cli::output::OutputFormat):
//! human tables, plain lines, a JSON envelope, JSONL records and TSV rows.

mod apply_report;
mod plan_report;
mod rule_table;

pub use apply_report::ApplyView;
pub use plan_report::PlanView;
pub use rule_table::{ExplainView, RuleTable};

use std::path::Path;

use console::measure_text_width;

/// Left-align `text` in a column of `width` visible characters.
fn pad(text: &str, width: usize) -> String {
    let visible = measure_text_width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

/// Widest visible cell per column.
fn column_widths<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> [usize; N] {
    let mut widths = headers.map(measure_text_width);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(cell));
        }
    }
    widths
}

fn display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
