//! SQLite provider backed by an sqlx pool.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, instrument};

use super::{migrate_error, ConnectionProvider};
use crate::connection::{connect_with_retry, Credentials, PoolConfig};
use crate::types::sqlite::{bind_all, column_names, decode_key, decode_row};
use crate::{DataAccessError, Result, Row, Statement};

/// SQLite connection provider.
///
/// Cloning is cheap; clones share the same pool.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    pool: SqlitePool,
}

impl SqliteProvider {
    /// Creates a pool from credentials.
    ///
    /// SQLite has no authentication; the username and password are accepted
    /// and ignored. The database file is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for a malformed URL, or a `QueryExecution`
    /// error of kind `Connection`/`Timeout` once all retries are exhausted.
    #[instrument(skip(credentials, pool_config), fields(url = %credentials.url()))]
    pub async fn connect(credentials: &Credentials, pool_config: &PoolConfig) -> Result<Self> {
        if !credentials.username().is_empty() || !credentials.password().is_empty() {
            debug!("SQLite ignores connection username and password");
        }

        let options = SqliteConnectOptions::from_str(credentials.url())
            .map_err(|e| DataAccessError::Configuration(format!("Invalid SQLite URL: {}", e)))?
            .create_if_missing(true)
            .statement_cache_capacity(pool_config.statement_cache_capacity);

        let pool = connect_with_retry(&pool_config.retry, || {
            let mut pool_options = SqlitePoolOptions::new()
                .min_connections(pool_config.min_connections)
                .max_connections(pool_config.max_connections)
                .acquire_timeout(Duration::from_secs(pool_config.connect_timeout));

            if let Some(lifetime) = pool_config.max_lifetime {
                pool_options = pool_options.max_lifetime(Duration::from_secs(lifetime));
            }
            if let Some(idle) = pool_config.idle_timeout {
                pool_options = pool_options.idle_timeout(Duration::from_secs(idle));
            }

            pool_options.connect_with(options.clone())
        })
        .await?;

        info!(
            max_connections = pool_config.max_connections,
            "SQLite connection pool established"
        );

        Ok(Self { pool })
    }

    /// Wraps an existing pool. The caller keeps ownership of its lifecycle.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ConnectionProvider for SqliteProvider {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn fetch(&self, statement: Arc<Statement>) -> BoxStream<'static, Result<Row>> {
        let pool = self.pool.clone();
        let rows = try_stream! {
            let arguments = bind_all(statement.params())?;
            let mut cursor = sqlx::query_with(statement.sql(), arguments).fetch(&pool);
            let mut columns: Option<Arc<[String]>> = None;

            while let Some(row) = cursor.try_next().await.map_err(DataAccessError::from)? {
                let names = columns.get_or_insert_with(|| column_names(&row)).clone();
                yield decode_row(&row, names)?;
            }
        };
        rows.boxed()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        let arguments = bind_all(statement.params())?;
        let result = sqlx::query_with(statement.sql(), arguments)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Statements with a `RETURNING` clause yield column 0 of every returned
    /// row. Otherwise an `INSERT`/`REPLACE` that inserted a row yields the last
    /// inserted rowid; for a multi-row insert that is the last row's key only.
    ///
    /// An upsert that takes its `DO UPDATE` branch leaves the connection's
    /// rowid unchanged and yields nothing. Use `RETURNING` to get the key of
    /// an updated row.
    fn generated_keys(&self, statement: Arc<Statement>) -> BoxStream<'static, Result<i64>> {
        let pool = self.pool.clone();

        if statement.has_returning_clause() {
            let keys = try_stream! {
                let arguments = bind_all(statement.params())?;
                let mut cursor = sqlx::query_with(statement.sql(), arguments).fetch(&pool);
                while let Some(row) = cursor.try_next().await.map_err(DataAccessError::from)? {
                    yield decode_key(&row)?;
                }
            };
            return keys.boxed();
        }

        let keys = try_stream! {
            let arguments = bind_all(statement.params())?;
            // last_insert_rowid is per connection
            let mut conn = pool.acquire().await.map_err(DataAccessError::from)?;
            let before: i64 = sqlx::query_scalar("SELECT last_insert_rowid()")
                .fetch_one(&mut *conn)
                .await
                .map_err(DataAccessError::from)?;
            let result = sqlx::query_with(statement.sql(), arguments)
                .execute(&mut *conn)
                .await
                .map_err(DataAccessError::from)?;

            let rowid = result.last_insert_rowid();
            if statement.is_insert() && result.rows_affected() > 0 && rowid != before {
                debug!(rowid, "generated key from last_insert_rowid");
                yield rowid;
            }
        };
        keys.boxed()
    }

    async fn run_migrations(&self, migrator: &Migrator) -> Result<()> {
        migrator.run(&self.pool).await.map_err(migrate_error)
    }

    async fn undo_migrations(&self, migrator: &Migrator) -> Result<()> {
        migrator.undo(&self.pool, 0).await.map_err(migrate_error)
    }
}
