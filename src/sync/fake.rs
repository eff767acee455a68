use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, anyhow};

use crate::db::{Database, Transaction};

/// In-memory database that records every call it receives.
#[derive(Default)]
pub struct FakeDb {
    pub name: String,
    pub tables: Vec<(String, String)>,
    pub procedures: Vec<(String, String)>,
    pub checksums: HashMap<String, Option<i64>>,
    /// Combined batches containing a `;\n` separator fail.
    pub reject_batches: bool,
    /// Any statement containing one of these fails.
    pub failing: Vec<String>,
    /// Procedures whose definition cannot be read.
    pub unreadable: Vec<String>,
    pub log: Rc<RefCell<Vec<String>>>,
}

impl FakeDb {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn table(mut self, name: &str, definition: &str) -> Self {
        self.tables.push((name.to_string(), definition.to_string()));
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn check(&self, sql: &str) -> Result<()> {
        if self.failing.iter().any(|needle| sql.contains(needle.as_str())) {
            return Err(anyhow!("rejected: {}", sql));
        }
        Ok(())
    }
}

impl Database for FakeDb {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    fn list_procedures(&self) -> Result<Vec<String>> {
        Ok(self.procedures.iter().map(|(name, _)| name.clone()).collect())
    }

    fn table_definition(&self, table: &str) -> Result<String> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, definition)| definition.clone())
            .ok_or_else(|| anyhow!("Table '{}' doesn't exist", table))
    }

    fn procedure_definition(&self, name: &str) -> Result<String> {
        if self.unreadable.iter().any(|proc_name| proc_name == name) {
            return Err(anyhow!("SHOW command denied for procedure '{}'", name));
        }
        Ok(self
            .procedures
            .iter()
            .find(|(proc_name, _)| proc_name == name)
            .map(|(_, definition)| definition.clone())
            .unwrap_or_default())
    }

    fn checksum_table(&self, table: &str) -> Result<Option<i64>> {
        Ok(self.checksums.get(table).copied().flatten())
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("exec:{}", sql));
        if self.reject_batches && sql.contains(";\n") {
            return Err(anyhow!("multi statements are not allowed"));
        }
        self.check(sql)
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        self.log.borrow_mut().push("begin".to_string());
        Ok(Box::new(FakeTx { db: self }))
    }
}

struct FakeTx<'a> {
    db: &'a FakeDb,
}

impl Transaction for FakeTx<'_> {
    fn execute(&mut self, sql: &str) -> Result<()> {
        self.db.log.borrow_mut().push(format!("tx:{}", sql));
        self.db.check(sql)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        self.db.log.borrow_mut().push("commit".to_string());
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        self.db.log.borrow_mut().push("rollback".to_string());
        Ok(())
    }
}
