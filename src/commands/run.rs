use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::commands::common;
use crate::config::Side;
use crate::db::{MySqlDatabase, new_runtime};
use crate::output::write_report;
use crate::sync::{RunStats, run_schema};

/// Totals across every schema of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success_total: usize,
    pub failed_total: usize,
}

pub fn run(args: &CliArgs) -> Result<RunSummary> {
    let config = common::load_config(args)?;
    config.check()?;
    if let Some(path) = &config.config_path {
        info!(config = %path.display(), "loaded config");
    }

    let runtime = new_runtime()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut runs: Vec<RunStats> = Vec::new();

    for schema in config.target_schemas()? {
        let source_settings = config.connection(Side::Source, &schema)?;
        let dest_settings = config.connection(Side::Dest, &schema)?;
        writeln!(out, "-- source: {}", source_settings.redacted())?;
        writeln!(out, "-- dest: {}\n", dest_settings.redacted())?;

        let source = MySqlDatabase::connect(&source_settings, runtime.clone())?;
        let dest = MySqlDatabase::connect(&dest_settings, runtime.clone())?;
        runs.push(run_schema(&config, &source, &dest, &mut out)?);
    }
    out.flush()?;

    if let Some(path) = &config.report_path {
        write_report(path, &runs)?;
        info!(report = %path.display(), "report written");
    }

    Ok(RunSummary {
        success_total: runs.iter().map(|run| run.success_total).sum(),
        failed_total: runs.iter().map(|run| run.failed_total).sum(),
    })
}
