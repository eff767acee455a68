use serde::Deserialize;

use super::rules::AlterIgnoreRules;

/// On-disk configuration. Keys follow the snake_case names of the JSON file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    pub source: Option<String>,
    pub dest: Option<String>,
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub tables_ignore: Vec<String>,
    #[serde(default)]
    pub tables_compare_data: Vec<String>,
    #[serde(default)]
    pub alter_ignore: AlterIgnoreRules,
    pub single_schema_change: Option<bool>,
    /// Pool acquire timeout in milliseconds.
    pub timeout: Option<u64>,
}
