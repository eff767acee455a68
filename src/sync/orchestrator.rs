use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::stats::{Outcome, RunStats, TableStats};
use crate::config::RunConfig;
use crate::db::Database;
use crate::schema::{AlterType, DiffOptions, TableAlterData, build_table_alter};

const MULTI_GROUP: &str = "multi";

/// Tables that run as one batch.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: String,
    pub tables: Vec<TableAlterData>,
}

impl Group {
    fn statements(&self) -> Vec<&str> {
        self.tables
            .iter()
            .flat_map(|alter| alter.statements.iter().map(String::as_str))
            .collect()
    }
}

/// Independent tables first, then the foreign-key-linked ones.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub singles: Vec<Group>,
    pub multi: Option<Group>,
}

impl Plan {
    /// Partitions scheduled tables. A table that references, or is
    /// referenced by, another scheduled table joins `multi`; self-references
    /// and links to tables outside the set do not count.
    pub fn build(alters: Vec<TableAlterData>) -> Self {
        let scheduled: BTreeSet<String> = alters.iter().map(|alter| alter.table.clone()).collect();
        let mut linked: BTreeSet<String> = BTreeSet::new();
        for alter in &alters {
            for other in alter.schema_diff.relation_tables() {
                if other != alter.table && scheduled.contains(&other) {
                    linked.insert(alter.table.clone());
                    linked.insert(other);
                }
            }
        }

        let mut plan = Plan::default();
        for alter in alters {
            if linked.contains(&alter.table) {
                plan.multi
                    .get_or_insert_with(|| Group {
                        key: MULTI_GROUP.to_string(),
                        tables: Vec::new(),
                    })
                    .tables
                    .push(alter);
            } else {
                plan.singles.push(Group {
                    key: format!("single_{}", alter.table),
                    tables: vec![alter],
                });
            }
        }
        plan
    }

    /// Groups in execution order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.singles.iter().chain(self.multi.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.singles.is_empty() && self.multi.is_none()
    }
}

pub struct SchemaSync<'a> {
    config: &'a RunConfig,
    source: &'a dyn Database,
    dest: &'a dyn Database,
}

impl<'a> SchemaSync<'a> {
    pub fn new(config: &'a RunConfig, source: &'a dyn Database, dest: &'a dyn Database) -> Self {
        Self {
            config,
            source,
            dest,
        }
    }

    /// Destination tables, then tables that only exist on the source.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut tables = self.dest.list_tables()?;
        for name in self.source.list_tables()? {
            if !tables.contains(&name) {
                tables.push(name);
            }
        }
        Ok(tables)
    }

    pub fn table_alter(&self, table: &str) -> TableAlterData {
        let source = fetch_definition(self.source, table);
        let dest = fetch_definition(self.dest, table);
        let options = DiffOptions {
            rules: &self.config.alter_ignore,
            drop: self.config.drop,
            single_schema_change: self.config.single_schema_change,
        };
        build_table_alter(table, &source, &dest, &options)
    }

    /// Classifies every selected table, prints its block, and groups the
    /// ones that need statements run.
    pub fn plan(&self, out: &mut dyn Write) -> Result<Plan> {
        let mut scheduled = Vec::new();
        for table in self.table_names()? {
            if !self.config.filter.is_selected(&table) {
                debug!(table, "not in tables list");
                continue;
            }
            if self.config.filter.is_ignored(&table) {
                debug!(table, "in tables_ignore");
                continue;
            }

            let alter = self.table_alter(&table);
            debug!(table, alter_type = alter.alter_type.as_str(), "classified");
            match alter.alter_type {
                AlterType::Unchanged => continue,
                AlterType::DropTable => {
                    writeln!(out, "{}\n", alter)?;
                    info!(table, "table only exists on dest; drop is not run automatically");
                }
                AlterType::Create | AlterType::Alter => {
                    writeln!(out, "{}\n", alter)?;
                    scheduled.push(alter);
                }
            }
        }
        Ok(Plan::build(scheduled))
    }

    /// Runs every group (when syncing) and records per-statement stats.
    pub fn execute(&self, plan: &Plan, stats: &mut RunStats) {
        for group in plan.groups() {
            let mut records: Vec<TableStats> = Vec::new();
            for alter in &group.tables {
                for statement in &alter.statements {
                    records.push(TableStats::start(alter, statement));
                }
            }

            let outcome = if self.config.sync {
                let statements = group.statements();
                let result = self.execute_batch(&statements).map_err(|err| format!("{:#}", err));
                match &result {
                    Ok(()) => info!(group = %group.key, statements = statements.len(), "group applied"),
                    Err(err) => error!(group = %group.key, error = %err, "group failed"),
                }
                stats.record(&result);
                match result {
                    Ok(()) => Outcome::Success,
                    Err(err) => Outcome::Failed(err),
                }
            } else {
                Outcome::DryRun
            };

            for mut record in records {
                let after = fetch_definition(self.dest, &record.table);
                record.finish(outcome.clone(), after);
                stats.tables.push(record);
            }
        }
    }

    /// Runs the statements as one batch. When that fails and there is more
    /// than one statement, retries them one by one inside a transaction,
    /// rolling back at the first failure.
    pub fn execute_batch(&self, statements: &[&str]) -> Result<()> {
        let parts: Vec<&str> = statements
            .iter()
            .map(|sql| sql.trim().trim_end_matches(';'))
            .filter(|sql| !sql.trim().is_empty())
            .collect();
        if parts.is_empty() {
            return Ok(());
        }
        let batch = format!("{};", parts.join(";\n"));

        let err = match self.dest.execute(&batch) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        if parts.len() < 2 {
            error!(error = %err, "EXEC_SQL_FAILED");
            return Err(err);
        }

        warn!(error = %err, "combined batch failed; running statements one by one");
        let mut tx = self.dest.begin()?;
        for sql in &parts {
            if let Err(err) = tx.execute(sql) {
                error!(sql, error = %err, "statement failed; rolling back");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                return Err(err);
            }
        }
        tx.commit()
    }

    /// Plans, prints, executes, and tallies the table changes.
    pub fn check_schema_diff(&self, out: &mut dyn Write, stats: &mut RunStats) -> Result<()> {
        let plan = self.plan(out)?;
        self.execute(&plan, stats);
        if self.config.sync {
            info!(
                success_total = stats.success_total,
                failed_total = stats.failed_total,
                "execute_all_sql_done"
            );
            writeln!(
                out,
                "# execute_all_sql_done, success_total: {}, failed_total: {}",
                stats.success_total, stats.failed_total
            )?;
        }
        Ok(())
    }
}

/// A definition that cannot be read counts as an absent table.
fn fetch_definition(db: &dyn Database, table: &str) -> String {
    match db.table_definition(table) {
        Ok(definition) => definition,
        Err(err) => {
            debug!(db = db.name(), table, error = %err, "definition unavailable");
            String::new()
        }
    }
}
