use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::schema::{AlterType, TableAlterData};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "kebab-case")]
pub enum Outcome {
    DryRun,
    Success,
    Failed(String),
}

impl Outcome {
    pub fn label(&self) -> String {
        match self {
            Outcome::DryRun => "dry-run".to_string(),
            Outcome::Success => "success".to_string(),
            Outcome::Failed(err) => format!("failed({})", err),
        }
    }
}

/// Bookkeeping for one scheduled statement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub table: String,
    pub alter_type: AlterType,
    pub statement: String,
    pub outcome: Outcome,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Source definition the destination was aligned with.
    pub schema_source: String,
    /// Destination definition read back after the group ran.
    pub schema_after: String,
    #[serde(skip)]
    started: Option<Instant>,
}

impl TableStats {
    pub fn start(alter: &TableAlterData, statement: &str) -> Self {
        Self {
            table: alter.table.clone(),
            alter_type: alter.alter_type,
            statement: statement.to_string(),
            outcome: Outcome::DryRun,
            elapsed: Duration::ZERO,
            schema_source: alter.schema_diff.source.raw.clone(),
            schema_after: String::new(),
            started: Some(Instant::now()),
        }
    }

    pub fn finish(&mut self, outcome: Outcome, schema_after: String) {
        self.outcome = outcome;
        self.schema_after = schema_after;
        if let Some(started) = self.started.take() {
            self.elapsed = started.elapsed();
        }
    }
}

/// Everything one schema's run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub schema: String,
    pub started_at: DateTime<Local>,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub sync: bool,
    pub success_total: usize,
    pub failed_total: usize,
    pub data_diff_tables: Vec<String>,
    pub tables: Vec<TableStats>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl RunStats {
    pub fn start(schema: &str, sync: bool) -> Self {
        Self {
            schema: schema.to_string(),
            started_at: Local::now(),
            elapsed: Duration::ZERO,
            sync,
            success_total: 0,
            failed_total: 0,
            data_diff_tables: Vec::new(),
            tables: Vec::new(),
            started: Some(Instant::now()),
        }
    }

    pub fn record(&mut self, result: &Result<(), String>) {
        match result {
            Ok(()) => self.success_total += 1,
            Err(_) => self.failed_total += 1,
        }
    }

    pub fn finish(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed = started.elapsed();
        }
    }
}

fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlterIgnoreRules;
    use crate::schema::{DiffOptions, build_table_alter};

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::DryRun.label(), "dry-run");
        assert_eq!(Outcome::Failed("boom".into()).label(), "failed(boom)");
    }

    #[test]
    fn table_stats_carry_source_and_after() {
        let rules = AlterIgnoreRules::default();
        let options = DiffOptions {
            rules: &rules,
            drop: false,
            single_schema_change: false,
        };
        let alter = build_table_alter("t", "CREATE TABLE `t` (\n  `a` int\n)", "", &options);
        let mut stats = TableStats::start(&alter, &alter.statements[0]);
        stats.finish(Outcome::Success, "after".to_string());
        assert_eq!(stats.schema_source, "CREATE TABLE `t` (\n  `a` int\n)");
        assert_eq!(stats.schema_after, "after");
        assert_eq!(stats.alter_type, AlterType::Create);

        let json = serde_json::to_value(&stats).expect("json");
        assert_eq!(json["outcome"]["status"], "success");
        assert_eq!(json["alterType"], "create");
    }

    #[test]
    fn run_stats_tally() {
        let mut run = RunStats::start("shop", true);
        run.record(&Ok(()));
        run.record(&Err("x".to_string()));
        run.record(&Ok(()));
        run.finish();
        assert_eq!(run.success_total, 2);
        assert_eq!(run.failed_total, 1);
    }
}
