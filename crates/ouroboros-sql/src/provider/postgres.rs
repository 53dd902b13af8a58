//! PostgreSQL provider backed by an sqlx pool.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{info, instrument};

use super::{migrate_error, ConnectionProvider};
use crate::connection::{connect_with_retry, redact_url, Credentials, PoolConfig};
use crate::types::postgres::{bind_all, column_names, decode_key, decode_row};
use crate::{DataAccessError, Result, Row, Statement};

/// PostgreSQL connection provider.
#[derive(Debug, Clone)]
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Creates a pool from credentials.
    ///
    /// The username and password override any userinfo embedded in the URL.
    #[instrument(skip(credentials, pool_config), fields(url = %redact_url(credentials.url())))]
    pub async fn connect(credentials: &Credentials, pool_config: &PoolConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(credentials.url())
            .map_err(|e| DataAccessError::Configuration(format!("Invalid PostgreSQL URL: {}", e)))?
            .username(credentials.username())
            .password(credentials.password())
            .statement_cache_capacity(pool_config.statement_cache_capacity);

        let pool = connect_with_retry(&pool_config.retry, || {
            let mut pool_options = PgPoolOptions::new()
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
            "PostgreSQL connection pool established"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Appends `RETURNING *` unless the statement already returns something.
fn with_returning(statement: &Statement) -> String {
    if statement.has_returning_clause() {
        statement.sql().to_string()
    } else {
        let sql = statement.sql().trim_end().trim_end_matches(';');
        format!("{} RETURNING *", sql)
    }
}

#[async_trait]
impl ConnectionProvider for PostgresProvider {
    fn backend(&self) -> &'static str {
        "postgres"
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

    /// Yields column 0 of every row the statement returns, adding
    /// `RETURNING *` when absent. The first column must be an integer.
    fn generated_keys(&self, statement: Arc<Statement>) -> BoxStream<'static, Result<i64>> {
        let pool = self.pool.clone();
        let keys = try_stream! {
            let sql = with_returning(&statement);
            let arguments = bind_all(statement.params())?;
            let mut cursor = sqlx::query_with(&sql, arguments).fetch(&pool);
            while let Some(row) = cursor.try_next().await.map_err(DataAccessError::from)? {
                yield decode_key(&row)?;
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
