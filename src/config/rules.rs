use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matcher::{matches, matches_any};

/// Names exempt from diffing on tables matching one `alter_ignore` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlterIgnoreTable {
    #[serde(default)]
    pub column: Vec<String>,
    #[serde(default)]
    pub index: Vec<String>,
    #[serde(default, rename = "foreign")]
    pub foreign_key: Vec<String>,
}

/// `alter_ignore`: table pattern to the names ignored on matching tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AlterIgnoreRules {
    tables: BTreeMap<String, Option<AlterIgnoreTable>>,
}

impl AlterIgnoreRules {
    pub fn insert(&mut self, table_pattern: &str, rule: AlterIgnoreTable) {
        self.tables.insert(table_pattern.to_string(), Some(rule));
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn ignores_column(&self, table: &str, name: &str) -> bool {
        self.rules_for(table)
            .any(|rule| matches_any(&rule.column, name))
    }

    pub fn ignores_index(&self, table: &str, name: &str) -> bool {
        self.rules_for(table).any(|rule| matches_any(&rule.index, name))
    }

    pub fn ignores_foreign_key(&self, table: &str, name: &str) -> bool {
        self.rules_for(table)
            .any(|rule| matches_any(&rule.foreign_key, name))
    }

    fn rules_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a AlterIgnoreTable> {
        self.tables
            .iter()
            .filter(move |(pattern, _)| matches(pattern, table))
            .filter_map(|(_, rule)| rule.as_ref())
    }
}

/// Table allow-list, ignore-list and data-comparison list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFilter {
    pub tables: Vec<String>,
    pub tables_ignore: Vec<String>,
    pub tables_compare_data: Vec<String>,
}

impl TableFilter {
    /// An empty allow-list selects every table.
    pub fn is_selected(&self, table: &str) -> bool {
        self.tables.is_empty() || matches_any(&self.tables, table)
    }

    pub fn is_ignored(&self, table: &str) -> bool {
        matches_any(&self.tables_ignore, table)
    }

    pub fn compares_data(&self, table: &str) -> bool {
        matches_any(&self.tables_compare_data, table)
    }
}
