//! Structured model of one table's `SHOW CREATE TABLE` output.
//!
//! Column order is significant and kept as an ordered list. Indexes and
//! foreign keys are keyed by name and compared as sets.

mod alter;
mod diff;
mod parser;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

pub use alter::{AlterType, DiffOptions, TableAlterData, build_table_alter};
pub use diff::SchemaDiff;
pub use parser::parse_table;

/// One column: its name and the full definition text, name included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    Fulltext,
    Spatial,
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub kind: IndexKind,
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub name: String,
    pub sql: String,
    pub referenced_table: String,
}

/// A named key-like clause that is replaced wholesale when its text changes.
pub trait KeyClause {
    fn name(&self) -> &str;
    fn sql(&self) -> &str;
    fn drop_clause(&self) -> String;

    /// `drop_existing` prepends the drop so the add can run right after it.
    fn add_clauses(&self, drop_existing: bool) -> Vec<String> {
        let mut clauses = Vec::with_capacity(2);
        if drop_existing {
            clauses.push(self.drop_clause());
        }
        clauses.push(format!("ADD {}", self.sql()));
        clauses
    }
}

impl KeyClause for IndexDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    fn drop_clause(&self) -> String {
        match self.kind {
            IndexKind::Primary => "DROP PRIMARY KEY".to_string(),
            IndexKind::Check => format!("DROP CHECK {}", quote_ident(&self.name)),
            _ => format!("DROP INDEX {}", quote_ident(&self.name)),
        }
    }
}

impl KeyClause for ForeignKeyDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn sql(&self) -> &str {
        &self.sql
    }

    fn drop_clause(&self) -> String {
        format!("DROP FOREIGN KEY {}", quote_ident(&self.name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    /// Definition text exactly as fetched; empty when the table is absent.
    pub raw: String,
    pub columns: Vec<Column>,
    pub indexes: BTreeMap<String, IndexDef>,
    pub foreign_keys: BTreeMap<String, ForeignKeyDef>,
    /// Engine/charset/partition clauses with the auto-increment counter removed.
    pub tail: String,
    body_end: usize,
}

impl TableSchema {
    pub fn parse(name: &str, definition: &str) -> Self {
        parse_table(name, definition)
    }

    /// Empty text means the table does not exist on that side. A definition
    /// that yields no columns is treated the same way.
    pub fn is_absent(&self) -> bool {
        self.raw.trim().is_empty() || self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Compares columns, indexes and foreign keys, ignoring the tail.
    pub fn same_structure(&self, other: &TableSchema) -> bool {
        self.columns == other.columns
            && self.indexes == other.indexes
            && self.foreign_keys == other.foreign_keys
    }

    /// The source `CREATE TABLE` with the auto-increment counter removed.
    pub fn create_statement(&self) -> String {
        let raw = self.raw.trim_end();
        let end = self.body_end.min(raw.len());
        let (head, tail) = raw.split_at(end);
        format!("{}{};", head, strip_auto_increment(tail))
    }

    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys
            .values()
            .map(|fk| fk.referenced_table.as_str())
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Removes the `AUTO_INCREMENT=<n>` table option; it changes on every insert.
pub fn strip_auto_increment(text: &str) -> String {
    auto_increment_re().replace_all(text, "").to_string()
}

fn auto_increment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+AUTO_INCREMENT=\d+\b").expect("valid regex"))
}
