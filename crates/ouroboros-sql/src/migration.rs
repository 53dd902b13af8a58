//! Schema migration gateway.
//!
//! Each `clean`/`migrate` call asks a [`MigrationFactory`] for a freshly
//! configured [`MigrationTool`]. The default tool loads an sqlx
//! [`Migrator`] from the migrations directory on every call, so scripts added
//! between calls are picked up.
//!
//! Migration files follow the sqlx naming scheme: `<VERSION>_<DESC>.sql` for
//! simple migrations, or `<VERSION>_<DESC>.up.sql` / `<VERSION>_<DESC>.down.sql`
//! pairs for reversible ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use tracing::{info, instrument};

use crate::connection::{ConnectionDescriptor, Credentials, PoolConfig};
use crate::provider::{migrate_error, ConnectionProvider, ProviderFactory};
use crate::Result;

/// Applies or reverts schema migrations.
#[async_trait]
pub trait MigrationTool: Send + Sync {
    /// Reverts applied migrations.
    async fn clean(&self) -> Result<()>;

    /// Applies all pending migrations in version order.
    async fn migrate(&self) -> Result<()>;
}

/// Builds a migration tool for a connection descriptor and migration location.
pub type MigrationFactory =
    Arc<dyn Fn(&ConnectionDescriptor, &Path) -> Result<Box<dyn MigrationTool>> + Send + Sync>;

/// Factory producing [`SqlxMigrationTool`]s.
///
/// Credentials are turned into a provider by `providers` with `pool`
/// settings, separately from the client's memoized provider.
pub fn sqlx_migration_factory(providers: Arc<dyn ProviderFactory>, pool: PoolConfig) -> MigrationFactory {
    Arc::new(move |descriptor: &ConnectionDescriptor, location: &Path| -> Result<Box<dyn MigrationTool>> {
        let target = match descriptor {
            ConnectionDescriptor::Provider(provider) => MigrationTarget::Provider(provider.clone()),
            ConnectionDescriptor::Credentials(credentials) => MigrationTarget::Credentials {
                credentials: credentials.clone(),
                pool: pool.clone(),
                providers: providers.clone(),
            },
        };
        Ok(Box::new(SqlxMigrationTool {
            target,
            location: location.to_path_buf(),
        }))
    })
}

enum MigrationTarget {
    Provider(Arc<dyn ConnectionProvider>),
    Credentials {
        credentials: Credentials,
        pool: PoolConfig,
        providers: Arc<dyn ProviderFactory>,
    },
}

/// Runs sqlx migrations from a directory.
///
/// `migrate` applies pending migrations. `clean` reverts every applied
/// reversible migration, newest first; simple (non-reversible) migrations
/// stay applied.
pub struct SqlxMigrationTool {
    target: MigrationTarget,
    location: PathBuf,
}

impl SqlxMigrationTool {
    pub fn new(provider: Arc<dyn ConnectionProvider>, location: impl Into<PathBuf>) -> Self {
        Self {
            target: MigrationTarget::Provider(provider),
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    async fn migrator(&self) -> Result<Migrator> {
        Migrator::new(self.location.clone()).await.map_err(migrate_error)
    }

    async fn provider(&self) -> Result<Arc<dyn ConnectionProvider>> {
        match &self.target {
            MigrationTarget::Provider(provider) => Ok(provider.clone()),
            MigrationTarget::Credentials {
                credentials,
                pool,
                providers,
            } => providers.connect(credentials, pool).await,
        }
    }
}

#[async_trait]
impl MigrationTool for SqlxMigrationTool {
    #[instrument(skip(self), fields(location = %self.location.display()))]
    async fn clean(&self) -> Result<()> {
        let migrator = self.migrator().await?;
        let provider = self.provider().await?;
        provider.undo_migrations(&migrator).await?;
        info!("Reverted applied migrations");
        Ok(())
    }

    #[instrument(skip(self), fields(location = %self.location.display()))]
    async fn migrate(&self) -> Result<()> {
        let migrator = self.migrator().await?;
        let provider = self.provider().await?;
        provider.run_migrations(&migrator).await?;
        info!(available = migrator.iter().count(), "Migrations applied");
        Ok(())
    }
}
