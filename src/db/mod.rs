/// Database Module
///
/// This module handles all PostgreSQL operations including:
/// - Connection pool management
/// - Scoped transaction lifetime (commit on success, rollback on failure)
/// - Parametrized statement-file execution, singleton or batched
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::config::DbConfig;
use crate::error::{EtlError, EtlResult};
use crate::models::{PreparedRow, SqlValue};

/// Parameters for one statement-file execution
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Statement text executed as-is; may hold several statements
    None,
    /// One parametrized execution
    #[allow(dead_code)]
    Single(PreparedRow),
    /// One parametrized execution per row, preserving input order
    Many(Vec<PreparedRow>),
}

/// Capability contract for executing statement files against the store
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Execute one statement file in its own scope, returning rows
    /// affected
    async fn execute_file(&self, path: &Path, params: Params) -> EtlResult<u64>;
}

#[async_trait]
impl<S: StatementStore + ?Sized> StatementStore for Arc<S> {
    async fn execute_file(&self, path: &Path, params: Params) -> EtlResult<u64> {
        (**self).execute_file(path, params).await
    }
}

pub struct DataStore {
    pool: PgPool,
    scope_active: AtomicBool,
}

impl DataStore {
    /// Connect a pool using validated connection parameters
    pub async fn connect(config: &DbConfig) -> EtlResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| EtlError::persistence(format!("failed to connect to PostgreSQL database: {e}")))?;

        Ok(Self { pool, scope_active: AtomicBool::new(false) })
    }

    /// Test the database connection
    pub async fn test_connection(&self) -> EtlResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| EtlError::persistence(format!("database connection test failed: {e}")))?;

        Ok(())
    }

    /// Open a connection scope with an active transaction.
    ///
    /// Scopes are exclusive: acquiring one while another is active on this
    /// store is a programming error and fails fast instead of deadlocking
    /// or silently reusing the outer scope.
    pub async fn begin_scope(&self) -> EtlResult<ConnectionScope<'_>> {
        if self.scope_active.swap(true, Ordering::AcqRel) {
            return Err(EtlError::persistence("connection scope already active; nested scopes are not supported"));
        }

        let tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.scope_active.store(false, Ordering::Release);
                return Err(EtlError::persistence(format!("failed to open transaction scope: {e}")));
            }
        };

        Ok(ConnectionScope { tx: Some(tx), active: &self.scope_active })
    }
}

#[async_trait]
impl StatementStore for DataStore {
    async fn execute_file(&self, path: &Path, params: Params) -> EtlResult<u64> {
        let mut scope = self.begin_scope().await?;

        match scope.apply_file(path, params).await {
            Ok(affected) => {
                scope.commit().await?;
                tracing::info!("Statement file {} executed successfully ({} rows)", path.display(), affected);
                Ok(affected)
            }
            Err(e) => {
                scope.rollback().await;
                Err(e)
            }
        }
    }
}

/// One live transaction scope, the sole owner of its connection.
///
/// Commit and rollback consume the scope. Dropping it uncommitted rolls
/// the transaction back when the connection returns to the pool, so
/// cancellation mid-run still releases cleanly.
pub struct ConnectionScope<'a> {
    tx: Option<Transaction<'static, Postgres>>,
    active: &'a AtomicBool,
}

impl ConnectionScope<'_> {
    /// Execute a statement file inside this scope, returning rows
    /// affected
    pub async fn apply_file(&mut self, path: &Path, params: Params) -> EtlResult<u64> {
        let sql = read_statement(path).await?;
        let tx = self.tx.as_mut().ok_or_else(|| EtlError::persistence("connection scope already released"))?;

        apply_params(tx, path, &sql, params).await
    }

    /// Commit and release the scope
    pub async fn commit(mut self) -> EtlResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.map_err(|e| EtlError::persistence(format!("failed to commit transaction: {e}")))?;
        }

        Ok(())
    }

    /// Roll back and release the scope.
    ///
    /// Rollback failures are logged and never shadow the error that
    /// triggered them.
    pub async fn rollback(mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                tracing::error!("Rollback failed while releasing connection scope: {}", e);
            }
        }
    }
}

impl Drop for ConnectionScope<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Read a statement file's text
pub async fn read_statement(path: &Path) -> EtlResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EtlError::persistence(format!("failed to read statement file {}: {e}", path.display())))
}

/// Apply a statement file's parameters against a live transaction, returning
/// total rows affected. Free `async fn` so its `Executor` future resolves with
/// concrete lifetimes (works around an HRTB limitation that otherwise surfaces
/// through the `#[async_trait]`-boxed caller).
async fn apply_params(tx: &mut Transaction<'_, Postgres>, path: &Path, sql: &str, params: Params) -> EtlResult<u64> {
    match params {
        Params::None => {
            // Simple protocol: schema and aggregation files may hold
            // several statements
            exec_raw(&mut **tx, sql).await.map_err(|e| execute_error(path, e))
        }
        Params::Single(row) => exec_row(&mut **tx, sql, &row).await.map_err(|e| execute_error(path, e)),
        Params::Many(rows) => {
            let mut affected = 0;

            for row in &rows {
                affected += exec_row(&mut **tx, sql, row).await.map_err(|e| execute_error(path, e))?;
            }

            Ok(affected)
        }
    }
}

/// Execute raw SQL (simple protocol) on a connection, returning rows
/// affected. Kept as a free `async fn` so the `Executor` future resolves
/// with concrete lifetimes (works around an HRTB limitation that otherwise
/// surfaces through the `#[async_trait]`-boxed caller).
fn exec_raw<'c>(conn: &'c mut PgConnection, sql: &'c str) -> BoxExecFut<'c> {
    // Pin `RawSql`'s database to Postgres explicitly: its `Execute` impl is
    // blanket over any `DB`, which otherwise makes the `Executor` selection
    // higher-ranked and trips a trait-solver limitation under the `Send` box.
    let query: sqlx::RawSql<'c> = sqlx::raw_sql(sql);
    Box::pin(async move {
        Ok(<&mut PgConnection as sqlx::Executor>::execute(conn, query).await?.rows_affected())
    })
}

/// Execute a parametrized statement with a bound row, returning rows
/// affected. Free fn for the same reason as [`exec_raw`].
fn exec_row<'c>(conn: &'c mut PgConnection, sql: &'c str, row: &'c PreparedRow) -> BoxExecFut<'c> {
    Box::pin(async move { Ok(bind_row(sqlx::query(sql), row).execute(conn).await?.rows_affected()) })
}

/// Boxed, `Send` database-execution future. Erasing the future behind a
/// `Send` trait object at a concrete-lifetime point keeps the invariant
/// `&mut PgConnection` borrow from defeating the higher-ranked `Send` bound
/// that `#[async_trait]` places on the boxed `execute_file` future.
type BoxExecFut<'c> = Pin<Box<dyn Future<Output = Result<u64, sqlx::Error>> + Send + 'c>>;

fn execute_error(path: &Path, e: sqlx::Error) -> EtlError {
    EtlError::persistence(format!("failed to execute statement file {}: {e}", path.display()))
}

/// Bind a prepared row's values in column order
fn bind_row<'q>(mut query: Query<'q, Postgres, PgArguments>, row: &PreparedRow) -> Query<'q, Postgres, PgArguments> {
    for value in row.values() {
        query = match value {
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Json(v) => query.bind(v.clone()),
        };
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_read_statement_reports_missing_file() {
        let path = PathBuf::from("sql/does_not_exist.sql");
        let err = read_statement(&path).await.unwrap_err();

        assert!(matches!(err, EtlError::Persistence(_)));
        assert!(err.to_string().contains("does_not_exist.sql"));
    }

    #[tokio::test]
    async fn test_read_statement_loads_schema_file() {
        let sql = read_statement(Path::new("sql/create_tables.sql")).await.unwrap();
        assert!(sql.contains("CREATE TABLE"));
    }
}
