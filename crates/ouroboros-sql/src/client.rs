//! The data-access client.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::instrument;

use crate::connection::{ConnectionConfig, ConnectionSource, PoolConfig};
use crate::migration::{sqlx_migration_factory, MigrationFactory, MigrationTool};
use crate::observer::{ExecutionObserver, TracingObserver};
use crate::provider::{ConnectionProvider, ProviderFactory, SqlxProviderFactory};
use crate::stream::RowStream;
use crate::update::UpdateExecution;
use crate::{Result, Statement, Value};

/// Issues queries and updates.
///
/// Every method only prepares work; execution starts when the returned
/// stream is polled or the update handle is consumed.
pub trait QueryRunner {
    /// Runs a query without parameters.
    fn query(&self, sql: &str) -> RowStream {
        self.query_with(sql, Vec::new())
    }

    /// Runs a query with positional parameters.
    fn query_with(&self, sql: &str, params: Vec<Value>) -> RowStream;

    /// Prepares a data-modifying statement.
    fn update(&self, sql: &str, params: Vec<Value>) -> UpdateExecution;
}

/// Data-access facade over a lazily resolved connection source.
///
/// Cloning is cheap; clones share the connection source, and with it the
/// memoized provider.
///
/// # Example
///
/// ```rust,ignore
/// use futures::TryStreamExt;
/// use ouroboros_sql::{params, DatabaseClient, QueryRunner};
///
/// let client = DatabaseClient::from_credentials("sqlite://app.db", "", "");
/// let ids: Vec<i64> = client
///     .update("INSERT INTO users(name) VALUES (?)", params!["alice"])
///     .generated_keys()
///     .try_collect()
///     .await?;
///
/// let mut rows = client.query_with("SELECT name FROM users WHERE id = ?", params![ids[0]]);
/// while let Some(row) = rows.try_next().await? {
///     println!("{}", row.get_as::<String, _>("name")?.unwrap_or_default());
/// }
/// ```
#[derive(Clone)]
pub struct DatabaseClient {
    source: Arc<ConnectionSource>,
    observer: Arc<dyn ExecutionObserver>,
    migrations: MigrationFactory,
}

impl DatabaseClient {
    /// Client over an externally managed provider.
    pub fn from_provider(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self::from_config(ConnectionConfig::with_provider(provider))
    }

    /// Client that builds its provider from credentials on first use.
    pub fn from_credentials(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::from_config(ConnectionConfig::with_credentials(url, username, password))
    }

    /// Client from a raw configuration.
    ///
    /// The configuration is not validated here; an under- or over-specified
    /// configuration fails with `Configuration` when the first query or
    /// update is consumed.
    pub fn from_config(config: ConnectionConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ConnectionConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub fn connection_source(&self) -> &ConnectionSource {
        &self.source
    }

    /// Reverts applied migrations.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an invalid connection configuration or
    /// migrations directory, or whatever the migration tool reports.
    #[instrument(skip(self), err)]
    pub async fn clean(&self) -> Result<()> {
        self.migration_tool()?.clean().await
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Same as [`clean`](Self::clean).
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<()> {
        self.migration_tool()?.migrate().await
    }

    fn migration_tool(&self) -> Result<Box<dyn MigrationTool>> {
        let descriptor = self.source.descriptor()?;
        (self.migrations)(&descriptor, &self.source.config().migrations)
    }
}

impl QueryRunner for DatabaseClient {
    fn query_with(&self, sql: &str, params: Vec<Value>) -> RowStream {
        RowStream::deferred(
            self.source.clone(),
            Arc::new(Statement::new(sql, params)),
            self.observer.clone(),
            |provider, statement| provider.fetch(statement),
        )
    }

    fn update(&self, sql: &str, params: Vec<Value>) -> UpdateExecution {
        UpdateExecution::new(
            self.source.clone(),
            Statement::new(sql, params),
            self.observer.clone(),
        )
    }
}

impl fmt::Debug for DatabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseClient")
            .field("source", &self.source)
            .finish()
    }
}

/// Builder for [`DatabaseClient`].
pub struct ClientBuilder {
    config: ConnectionConfig,
    observer: Option<Arc<dyn ExecutionObserver>>,
    provider_factory: Option<Arc<dyn ProviderFactory>>,
    migration_factory: Option<MigrationFactory>,
}

impl ClientBuilder {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            observer: None,
            provider_factory: None,
            migration_factory: None,
        }
    }

    /// Receives statement failures and completions. Defaults to [`TracingObserver`].
    pub fn observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds providers from credentials. Defaults to [`SqlxProviderFactory`].
    pub fn provider_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.provider_factory = Some(factory);
        self
    }

    /// Builds migration tools for `clean`/`migrate`. Defaults to
    /// [`sqlx_migration_factory`] over the provider factory.
    pub fn migration_factory(mut self, factory: MigrationFactory) -> Self {
        self.migration_factory = Some(factory);
        self
    }

    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.migrations = dir.into();
        self
    }

    pub fn pool_config(mut self, pool: PoolConfig) -> Self {
        self.config.pool = pool;
        self
    }

    pub fn build(self) -> DatabaseClient {
        let providers = self
            .provider_factory
            .unwrap_or_else(|| Arc::new(SqlxProviderFactory));
        let migrations = self
            .migration_factory
            .unwrap_or_else(|| sqlx_migration_factory(providers.clone(), self.config.pool.clone()));
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(TracingObserver::default()));

        DatabaseClient {
            source: Arc::new(ConnectionSource::with_factory(self.config, providers)),
            observer,
            migrations,
        }
    }
}
