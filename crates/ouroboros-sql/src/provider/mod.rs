//! Live connection providers.
//!
//! A [`ConnectionProvider`] is the resolved, live side of a connection
//! source: it owns (or borrows from its creator) a connection pool and
//! executes statements against it. The provider is shared by every query a
//! client issues; pooling and locking are the provider's concern.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use sqlx::migrate::{MigrateError, Migrator};

use crate::connection::{Credentials, PoolConfig};
use crate::{DataAccessError, ExecutionErrorKind, Result, Row, Statement};

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresProvider;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProvider;

/// Executes statements against a live store.
///
/// `fetch` and `generated_keys` return streams that own everything they
/// need; no work happens until they are polled, and dropping them releases
/// the underlying cursor and pooled connection.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Short backend name used in logs ("sqlite", "postgres", ...).
    fn backend(&self) -> &'static str;

    /// Streams the rows produced by a query, in cursor order.
    fn fetch(&self, statement: Arc<Statement>) -> BoxStream<'static, Result<Row>>;

    /// Executes a statement and returns the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64>;

    /// Executes a statement and streams its generated keys, in generation order.
    fn generated_keys(&self, statement: Arc<Statement>) -> BoxStream<'static, Result<i64>>;

    /// Applies all pending migrations of `migrator`.
    async fn run_migrations(&self, _migrator: &Migrator) -> Result<()> {
        Err(DataAccessError::Configuration(format!(
            "{} provider does not support migrations",
            self.backend()
        )))
    }

    /// Reverts every applied reversible migration of `migrator`.
    async fn undo_migrations(&self, _migrator: &Migrator) -> Result<()> {
        Err(DataAccessError::Configuration(format!(
            "{} provider does not support migrations",
            self.backend()
        )))
    }
}

/// Maps a migration failure onto the data access error taxonomy.
pub(crate) fn migrate_error(err: MigrateError) -> DataAccessError {
    match err {
        MigrateError::Execute(e) => e.into(),
        MigrateError::ExecuteMigration(e, version) => DataAccessError::execution(
            ExecutionErrorKind::Database,
            format!("Migration {} failed: {}", version, e),
        ),
        MigrateError::Source(e) => {
            DataAccessError::Configuration(format!("Failed to load migrations: {}", e))
        }
        other => DataAccessError::execution(ExecutionErrorKind::Database, other.to_string()),
    }
}

/// Builds a live provider from credentials.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
        pool: &PoolConfig,
    ) -> Result<Arc<dyn ConnectionProvider>>;
}

/// sqlx backend selected from a connection URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    #[cfg(feature = "sqlite")]
    Sqlite,
    #[cfg(feature = "postgres")]
    Postgres,
}

impl Backend {
    /// Picks the backend for `url`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for schemes that are unknown or whose backend
    /// feature is not compiled in.
    pub fn from_url(url: &str) -> Result<Self> {
        #[cfg(feature = "sqlite")]
        if url.starts_with("sqlite:") {
            return Ok(Backend::Sqlite);
        }

        #[cfg(feature = "postgres")]
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Backend::Postgres);
        }

        let scheme = url.split(':').next().unwrap_or_default();
        Err(DataAccessError::Configuration(format!(
            "Unsupported connection URL scheme '{}'",
            scheme
        )))
    }
}

/// Default factory: picks a sqlx backend from the URL scheme.
///
/// - `sqlite:` → [`SqliteProvider`]
/// - `postgres://`, `postgresql://` → [`PostgresProvider`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxProviderFactory;

#[async_trait]
impl ProviderFactory for SqlxProviderFactory {
    async fn connect(
        &self,
        credentials: &Credentials,
        pool: &PoolConfig,
    ) -> Result<Arc<dyn ConnectionProvider>> {
        match Backend::from_url(credentials.url())? {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Ok(Arc::new(SqliteProvider::connect(credentials, pool).await?)),
            #[cfg(feature = "postgres")]
            Backend::Postgres => Ok(Arc::new(PostgresProvider::connect(credentials, pool).await?)),
        }
    }
}
