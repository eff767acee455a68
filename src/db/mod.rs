//! Database collaborator used by the reconciliation run.
//!
//! Every call blocks until the server answers. The MySQL implementation
//! drives an async pool on a shared runtime; tests plug in an in-memory one.

pub mod client;
pub mod connection;
pub mod queries;

use anyhow::Result;

pub use client::{MySqlDatabase, new_runtime};

pub trait Database {
    /// Schema (database) this handle is bound to.
    fn name(&self) -> &str;

    /// Base tables only; views are excluded.
    fn list_tables(&self) -> Result<Vec<String>>;

    fn list_procedures(&self) -> Result<Vec<String>>;

    /// `SHOW CREATE TABLE` text; an error means the table could not be read.
    fn table_definition(&self, table: &str) -> Result<String>;

    /// `SHOW CREATE PROCEDURE` text; empty when unreadable.
    fn procedure_definition(&self, name: &str) -> Result<String>;

    /// `None` when the server reports no checksum (e.g. the table is missing).
    fn checksum_table(&self, table: &str) -> Result<Option<i64>>;

    /// Runs a batch that may hold several `;`-separated statements.
    fn execute(&self, sql: &str) -> Result<()>;

    fn begin(&self) -> Result<Box<dyn Transaction + '_>>;
}

pub trait Transaction {
    fn execute(&mut self, sql: &str) -> Result<()>;
    fn commit(self: Box<Self>) -> Result<()>;
    fn rollback(self: Box<Self>) -> Result<()>;
}
