//! Reconciliation of one target schema: data checksums, stored procedures,
//! then table structure.

mod data;
#[cfg(test)]
mod fake;
mod orchestrator;
mod procedures;
mod stats;

use std::io::Write;

use anyhow::Result;
use tracing::info;

pub use data::check_data_diff;
pub use orchestrator::{Group, Plan, SchemaSync};
pub use procedures::check_procedures;
pub use stats::{Outcome, RunStats, TableStats};

use crate::config::RunConfig;
use crate::db::Database;

/// Runs the whole pipeline for one schema and returns its statistics.
pub fn run_schema(
    config: &RunConfig,
    source: &dyn Database,
    dest: &dyn Database,
    out: &mut dyn Write,
) -> Result<RunStats> {
    let mut stats = RunStats::start(dest.name(), config.sync);
    info!(
        schema = dest.name(),
        sync = config.sync,
        drop = config.drop,
        "reconciling schema"
    );

    stats.data_diff_tables = check_data_diff(source, dest, &config.filter, out)?;
    check_procedures(source, dest, config.sync, out, &mut stats)?;
    SchemaSync::new(config, source, dest).check_schema_diff(out, &mut stats)?;

    stats.finish();
    Ok(stats)
}
