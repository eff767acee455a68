#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use anyhow::{Result, anyhow};
use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use schemasync::db::{Database, Transaction};

/// Binary isolated from any config, `.env`, or environment on the host.
pub fn schemasync(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("schemasync");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SCHEMA_SYNC_SOURCE")
        .env_remove("SCHEMA_SYNC_DEST")
        .env_remove("SCHEMA_SYNC_SCHEMAS")
        .env_remove("SCHEMA_SYNC_SINGLE_SCHEMA_CHANGE")
        .env_remove("SCHEMA_SYNC_CONFIG");
    cmd
}

pub fn create_table(name: &str, body: &str) -> String {
    format!(
        "CREATE TABLE `{}` (\n{}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        name, body
    )
}

/// In-memory schema whose executed statements are recorded.
#[derive(Default)]
pub struct MemoryDb {
    pub name: String,
    pub tables: RefCell<Vec<(String, String)>>,
    pub procedures: Vec<(String, String)>,
    pub executed: RefCell<Vec<String>>,
    pub failing: Vec<String>,
}

impl MemoryDb {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_table(self, name: &str, definition: &str) -> Self {
        self.tables
            .borrow_mut()
            .push((name.to_string(), definition.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }

    fn run(&self, sql: &str) -> Result<()> {
        self.executed.borrow_mut().push(sql.to_string());
        if self.failing.iter().any(|needle| sql.contains(needle.as_str())) {
            return Err(anyhow!("Error 1064: rejected {}", sql));
        }
        Ok(())
    }
}

impl Database for MemoryDb {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.borrow().iter().map(|(n, _)| n.clone()).collect())
    }

    fn list_procedures(&self) -> Result<Vec<String>> {
        Ok(self.procedures.iter().map(|(n, _)| n.clone()).collect())
    }

    fn table_definition(&self, table: &str) -> Result<String> {
        self.tables
            .borrow()
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, def)| def.clone())
            .ok_or_else(|| anyhow!("Table '{}' doesn't exist", table))
    }

    fn procedure_definition(&self, name: &str) -> Result<String> {
        Ok(self
            .procedures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def.clone())
            .unwrap_or_default())
    }

    fn checksum_table(&self, _table: &str) -> Result<Option<i64>> {
        Ok(Some(0))
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.run(sql)
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(MemoryTx { db: self }))
    }
}

struct MemoryTx<'a> {
    db: &'a MemoryDb,
}

impl Transaction for MemoryTx<'_> {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.db.run(sql)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
