use comfy_table::{ContentArrangement, Table, presets};

use super::ReportFormat;
use crate::sync::RunStats;

const ELLIPSIS: &str = "…";
pub const DEFAULT_MAX_CELL_WIDTH: usize = 80;

/// One row per recorded statement across every schema.
pub fn render_stats_table(runs: &[RunStats], format: ReportFormat, max_cell_width: usize) -> String {
    let mut table = Table::new();
    match format {
        ReportFormat::Markdown => {
            table.load_preset(presets::ASCII_MARKDOWN);
        }
        _ => {
            table.load_preset(presets::UTF8_FULL);
        }
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Schema",
        "Table",
        "Type",
        "Outcome",
        "Elapsed (ms)",
        "Statement",
    ]);

    for run in runs {
        for stats in &run.tables {
            table.add_row(vec![
                run.schema.clone(),
                stats.table.clone(),
                stats.alter_type.as_str().to_string(),
                truncate_string(&stats.outcome.label(), max_cell_width),
                stats.elapsed.as_millis().to_string(),
                truncate_string(&single_line(&stats.statement), max_cell_width),
            ]);
        }
    }

    table.to_string()
}

fn single_line(statement: &str) -> String {
    statement.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_string(input: &str, max_len: usize) -> String {
    let len = input.chars().count();
    if len <= max_len {
        return input.to_string();
    }
    if max_len <= 1 {
        return ELLIPSIS.to_string();
    }
    let truncated: String = input.chars().take(max_len - 1).collect();
    format!("{}{}", truncated, ELLIPSIS)
}
