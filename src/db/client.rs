use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::mysql::{MySql, MySqlPool, MySqlRow};
use sqlx::Row;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::connection::{build_options, pool_options};
use super::{Database, Transaction, queries};
use crate::config::ConnectionSettings;
use crate::error::AppError;

/// Current-thread runtime shared by every connection of a run.
pub fn new_runtime() -> Result<Arc<Runtime>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(Arc::new(runtime))
}

pub struct MySqlDatabase {
    name: String,
    pool: MySqlPool,
    runtime: Arc<Runtime>,
}

impl MySqlDatabase {
    /// Connects and pings the server.
    ///
    /// # Errors
    ///
    /// Returns a `Connection` error if the pool cannot be created within the
    /// configured timeout or the ping fails.
    pub fn connect(settings: &ConnectionSettings, runtime: Arc<Runtime>) -> Result<Self> {
        let name = settings.database.clone().unwrap_or_default();
        let options = build_options(settings);
        let pool = runtime.block_on(async {
            let pool = pool_options(settings)
                .connect_with(options)
                .await
                .map_err(|err| {
                    AppError::connection(format!("{}: {}", settings.redacted(), err))
                })?;
            sqlx::query(queries::PING)
                .execute(&pool)
                .await
                .map_err(|err| {
                    AppError::connection(format!("{}: {}", settings.redacted(), err))
                })?;
            Ok::<_, AppError>(pool)
        })?;
        info!(server = %settings.redacted(), "connected");
        Ok(Self {
            name,
            pool,
            runtime,
        })
    }

    fn fetch_all(&self, sql: &str) -> Result<Vec<MySqlRow>> {
        debug!(sql, "query");
        let rows = self
            .runtime
            .block_on(sqlx::query(sql).fetch_all(&self.pool))?;
        Ok(rows)
    }
}

impl Database for MySqlDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self
            .fetch_all(queries::TABLES)
            .map_err(|err| AppError::query(format!("list tables of {}: {}", self.name, err)))?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.try_get(1).unwrap_or_default();
            if kind.eq_ignore_ascii_case("BASE TABLE") {
                tables.push(row.try_get::<String, _>(0)?);
            }
        }
        Ok(tables)
    }

    fn list_procedures(&self) -> Result<Vec<String>> {
        let rows = self.fetch_all(queries::PROCEDURES).map_err(|err| {
            AppError::query(format!("list procedures of {}: {}", self.name, err))
        })?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("Name").map_err(Into::into))
            .collect()
    }

    fn table_definition(&self, table: &str) -> Result<String> {
        let rows = self.fetch_all(&queries::show_create_table(table))?;
        match rows.first() {
            Some(row) => Ok(row.try_get::<String, _>(1)?),
            None => Ok(String::new()),
        }
    }

    fn procedure_definition(&self, name: &str) -> Result<String> {
        let rows = self.fetch_all(&queries::show_create_procedure(name))?;
        let definition = rows
            .first()
            .and_then(|row| row.try_get::<Option<String>, _>(2).ok().flatten())
            .unwrap_or_default();
        Ok(definition)
    }

    fn checksum_table(&self, table: &str) -> Result<Option<i64>> {
        let rows = self
            .fetch_all(&queries::checksum_table(table))
            .map_err(|err| AppError::query(format!("checksum {}: {}", table, err)))?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let checksum = row
            .try_get::<Option<i64>, _>(1)
            .or_else(|_| row.try_get::<Option<u64>, _>(1).map(|v| v.map(|v| v as i64)))?;
        Ok(checksum)
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&self.pool))?;
        Ok(())
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        let tx = self.runtime.block_on(self.pool.begin())?;
        Ok(Box::new(MySqlTransaction {
            tx: Some(tx),
            runtime: Arc::clone(&self.runtime),
        }))
    }
}

impl Drop for MySqlDatabase {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

pub struct MySqlTransaction {
    tx: Option<sqlx::Transaction<'static, MySql>>,
    runtime: Arc<Runtime>,
}

impl Transaction for MySqlTransaction {
    fn execute(&mut self, sql: &str) -> Result<()> {
        let tx = self
            .tx
            .as_mut()
            .context("transaction already finished")?;
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut **tx))?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            self.runtime.block_on(tx.commit())?;
        }
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            self.runtime.block_on(tx.rollback())?;
        }
        Ok(())
    }
}

impl Drop for MySqlTransaction {
    fn drop(&mut self) {
        // sqlx returns the connection on a spawned task, which needs a runtime context.
        if let Some(tx) = self.tx.take() {
            let _guard = self.runtime.enter();
            drop(tx);
        }
    }
}
