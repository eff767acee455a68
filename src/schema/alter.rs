use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{SchemaDiff, quote_ident};
use crate::config::AlterIgnoreRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlterType {
    Unchanged,
    Create,
    DropTable,
    Alter,
}

impl AlterType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlterType::Unchanged => "not_change",
            AlterType::Create => "create",
            AlterType::DropTable => "drop",
            AlterType::Alter => "alter",
        }
    }
}

/// Settings that shape how a table's changes are computed and assembled.
#[derive(Debug, Clone, Copy)]
pub struct DiffOptions<'a> {
    pub rules: &'a AlterIgnoreRules,
    pub drop: bool,
    pub single_schema_change: bool,
}

/// Ready-to-run statements for one table.
#[derive(Debug, Clone)]
pub struct TableAlterData {
    pub table: String,
    pub alter_type: AlterType,
    pub statements: Vec<String>,
    pub comment: String,
    pub schema_diff: Arc<SchemaDiff>,
}

impl TableAlterData {
    fn unchanged(table: &str, schema_diff: Arc<SchemaDiff>) -> Self {
        Self {
            table: table.to_string(),
            alter_type: AlterType::Unchanged,
            statements: Vec::new(),
            comment: String::new(),
            schema_diff,
        }
    }

    /// One copy per statement, sharing everything else.
    pub fn split(&self) -> Vec<TableAlterData> {
        self.statements
            .iter()
            .map(|statement| TableAlterData {
                statements: vec![statement.clone()],
                ..self.clone()
            })
            .collect()
    }
}

impl fmt::Display for TableAlterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-- Table : {}", self.table)?;
        for statement in &self.statements {
            write!(f, "\n{}", statement)?;
        }
        Ok(())
    }
}

/// Classifies one table and builds its statements from the two definition
/// texts. Empty text means the table is absent on that side.
pub fn build_table_alter(
    table: &str,
    source: &str,
    dest: &str,
    options: &DiffOptions<'_>,
) -> TableAlterData {
    let schema_diff = Arc::new(SchemaDiff::new(table, source, dest));
    let mut alter = TableAlterData::unchanged(table, Arc::clone(&schema_diff));

    if source == dest {
        return alter;
    }
    if schema_diff.source.is_absent() {
        if schema_diff.dest.is_absent() {
            return alter;
        }
        alter.alter_type = AlterType::DropTable;
        alter.comment = "table is absent on source; drop the orphan on destination".to_string();
        alter.statements.push(format!("DROP TABLE {};", quote_ident(table)));
        return alter;
    }
    if schema_diff.dest.is_absent() {
        alter.alter_type = AlterType::Create;
        alter.comment = "table is absent on destination; create it".to_string();
        alter.statements.push(schema_diff.source.create_statement());
        return alter;
    }
    if schema_diff.source.same_structure(&schema_diff.dest) {
        debug!(table, "only the table options differ");
        return alter;
    }

    let clauses = schema_diff.alter_clauses(options.rules, options.drop);
    if clauses.is_empty() {
        return alter;
    }
    alter.alter_type = AlterType::Alter;
    alter.comment = format!("{} change(s)", clauses.len());
    alter.statements = assemble(table, &clauses, options.single_schema_change);
    alter
}

/// Wraps clauses into one combined `ALTER TABLE`, or one per clause.
fn assemble(table: &str, clauses: &[String], single_schema_change: bool) -> Vec<String> {
    let quoted = quote_ident(table);
    if single_schema_change {
        clauses
            .iter()
            .map(|clause| format!("ALTER TABLE {}\n{};", quoted, clause))
            .collect()
    } else {
        vec![format!("ALTER TABLE {}\n{};", quoted, clauses.join(",\n"))]
    }
}
