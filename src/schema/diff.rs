use std::collections::{BTreeMap, BTreeSet};

use super::{KeyClause, TableSchema, quote_ident};
use crate::config::AlterIgnoreRules;

/// Source and destination models for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiff {
    pub table: String,
    pub source: TableSchema,
    pub dest: TableSchema,
}

impl SchemaDiff {
    pub fn new(table: &str, source: &str, dest: &str) -> Self {
        Self {
            table: table.to_string(),
            source: TableSchema::parse(table, source),
            dest: TableSchema::parse(table, dest),
        }
    }

    /// Tables referenced by a foreign key on either side.
    pub fn relation_tables(&self) -> BTreeSet<String> {
        self.source
            .referenced_tables()
            .chain(self.dest.referenced_tables())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Ordered alteration clauses that turn the destination into the source.
    ///
    /// Column changes come first, then column drops, then indexes, then
    /// foreign keys. Removals only appear when `drop` is set.
    pub fn alter_clauses(&self, rules: &AlterIgnoreRules, drop: bool) -> Vec<String> {
        let table = self.table.as_str();
        let mut clauses = self.column_clauses(rules);

        if drop {
            for column in &self.dest.columns {
                if rules.ignores_column(table, &column.name) {
                    continue;
                }
                if self.source.column(&column.name).is_none() {
                    clauses.push(format!("DROP {}", quote_ident(&column.name)));
                }
            }
        }

        clauses.extend(key_clauses(
            &self.source.indexes,
            &self.dest.indexes,
            drop,
            |name| rules.ignores_index(table, name),
        ));
        clauses.extend(key_clauses(
            &self.source.foreign_keys,
            &self.dest.foreign_keys,
            drop,
            |name| rules.ignores_foreign_key(table, name),
        ));
        clauses
    }

    fn column_clauses(&self, rules: &AlterIgnoreRules) -> Vec<String> {
        let mut clauses = Vec::new();
        let mut anchor: Option<&str> = None;
        let mut processed = 0usize;

        for column in &self.source.columns {
            if rules.ignores_column(&self.table, &column.name) {
                continue;
            }
            match self.dest.column(&column.name) {
                Some(existing) => {
                    if existing.definition != column.definition {
                        clauses.push(format!(
                            "CHANGE {} {}",
                            quote_ident(&column.name),
                            column.definition
                        ));
                    }
                }
                None => {
                    let clause = match anchor {
                        Some(previous) => format!(
                            "ADD {} AFTER {}",
                            column.definition,
                            quote_ident(previous)
                        ),
                        None if processed == 0 => format!("ADD {} FIRST", column.definition),
                        None => format!("ADD {}", column.definition),
                    };
                    clauses.push(clause);
                }
            }
            anchor = Some(&column.name);
            processed += 1;
        }
        clauses
    }
}

/// Shared add/change/drop pass for indexes and foreign keys. A definition
/// that differs at all is dropped and re-added.
fn key_clauses<K: KeyClause>(
    source: &BTreeMap<String, K>,
    dest: &BTreeMap<String, K>,
    drop: bool,
    ignored: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut clauses = Vec::new();
    for (name, key) in source {
        if ignored(name) {
            continue;
        }
        match dest.get(name) {
            Some(existing) if existing.sql() != key.sql() => {
                clauses.extend(key.add_clauses(true));
            }
            Some(_) => {}
            None => clauses.extend(key.add_clauses(false)),
        }
    }

    if drop {
        for (name, key) in dest {
            if ignored(name) || source.contains_key(name) {
                continue;
            }
            clauses.push(key.drop_clause());
        }
    }
    clauses
}
