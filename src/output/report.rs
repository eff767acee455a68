use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::{Value, json};
use similar::TextDiff;

use super::ReportFormat;
use super::json::emit_json;
use super::table::{DEFAULT_MAX_CELL_WIDTH, render_stats_table};
use crate::schema::{TableSchema, strip_auto_increment};
use crate::sync::{RunStats, TableStats};

/// Unified diff between the source definition and what the destination
/// holds after the run, or `None` when they now agree.
pub fn remaining_diff(stats: &TableStats) -> Option<String> {
    let source = TableSchema::parse(&stats.table, &stats.schema_source);
    let after = TableSchema::parse(&stats.table, &stats.schema_after);
    if source.same_structure(&after) {
        return None;
    }
    let left = strip_auto_increment(&stats.schema_source);
    let right = strip_auto_increment(&stats.schema_after);
    let diff = TextDiff::from_lines(&left, &right)
        .unified_diff()
        .context_radius(3)
        .header("source", "dest")
        .to_string();
    Some(diff)
}

pub fn render_report(runs: &[RunStats], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => render_json(runs),
        ReportFormat::Markdown => Ok(render_markdown(runs)),
        ReportFormat::Pretty => Ok(render_pretty(runs)),
    }
}

pub fn write_report(path: &Path, runs: &[RunStats]) -> Result<()> {
    let body = render_report(runs, ReportFormat::from_path(path))?;
    fs::write(path, body)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

fn render_json(runs: &[RunStats]) -> Result<String> {
    let mut schemas = Vec::with_capacity(runs.len());
    for run in runs {
        let mut value = serde_json::to_value(run)?;
        if let Some(Value::Array(tables)) = value.get_mut("tables") {
            for (entry, stats) in tables.iter_mut().zip(&run.tables) {
                if let Value::Object(map) = entry {
                    map.insert(
                        "remainingDiff".to_string(),
                        remaining_diff(stats).map(Value::String).unwrap_or(Value::Null),
                    );
                }
            }
        }
        schemas.push(value);
    }
    let payload = json!({
        "generatedAt": Local::now().to_rfc3339(),
        "schemas": schemas,
    });
    emit_json(&payload, true)
}

fn render_markdown(runs: &[RunStats]) -> String {
    let mut out = format!(
        "# Schema sync report\n\nGenerated: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for run in runs {
        out.push_str(&format!("## {}\n\n", run.schema));
        out.push_str(&summary_line(run));
        out.push_str("\n\n");
        if !run.data_diff_tables.is_empty() {
            out.push_str(&format!(
                "Data differs: {}\n\n",
                run.data_diff_tables.join(", ")
            ));
        }
        out.push_str(&render_stats_table(
            std::slice::from_ref(run),
            ReportFormat::Markdown,
            DEFAULT_MAX_CELL_WIDTH,
        ));
        out.push_str("\n\n");
        for stats in &run.tables {
            if let Some(diff) = remaining_diff(stats) {
                out.push_str(&format!("### {}\n\n```diff\n{}```\n\n", stats.table, diff));
            }
        }
    }
    out
}

fn render_pretty(runs: &[RunStats]) -> String {
    let mut out = String::new();
    for run in runs {
        out.push_str(&format!("{}: {}\n", run.schema, summary_line(run)));
    }
    out.push_str(&render_stats_table(runs, ReportFormat::Pretty, DEFAULT_MAX_CELL_WIDTH));
    out.push('\n');
    out
}

fn summary_line(run: &RunStats) -> String {
    format!(
        "started {}, {} ms, sync: {}, success: {}, failed: {}",
        run.started_at.format("%Y-%m-%d %H:%M:%S"),
        run.elapsed.as_millis(),
        run.sync,
        run.success_total,
        run.failed_total
    )
}
