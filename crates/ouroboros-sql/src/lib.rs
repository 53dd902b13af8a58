//! Async SQL data-access facade with lazy, cancellable result streams.
//!
//! Application code issues SQL queries and updates through one client,
//! whether the connection comes from an externally managed pool or is built
//! from a (url, username, password) triple on first use.
//!
//! # Architecture
//!
//! ```text
//! DatabaseClient (QueryRunner: query / query_with / update, clean / migrate)
//!           |
//!   ConnectionSource (validated once, resolved lazily, memoized)
//!           |
//!   ConnectionProvider (SqliteProvider, PostgresProvider, or your own)
//!           |
//!         SQLx (pooled driver)
//! ```
//!
//! # Key Features
//!
//! - **Cold streams**: `query` returns a [`RowStream`] and nothing executes
//!   until it is polled. Re-issuing a query re-executes it against live state.
//! - **Cancellation**: dropping a stream, calling `cancel()`, or firing an
//!   attached `CancellationToken` releases the cursor and its pooled
//!   connection; no further items are delivered.
//! - **Deferred updates**: `update` returns an [`UpdateExecution`] consumed
//!   either as an affected-row count or as a stream of generated keys.
//! - **Uniform errors**: every failure is a [`DataAccessError`]; execution
//!   failures are reported to an [`ExecutionObserver`] before they surface.
//! - **Migrations**: `clean`/`migrate` delegate to a freshly configured
//!   [`MigrationTool`] on every call (sqlx migrations by default).
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use ouroboros_sql::{params, DatabaseClient, QueryRunner};
//!
//! # async fn example() -> ouroboros_sql::Result<()> {
//! let client = DatabaseClient::from_credentials("sqlite://app.db", "", "");
//! client.migrate().await?;
//!
//! let affected = client
//!     .update("UPDATE users SET active = ? WHERE id = ?", params![true, 7])
//!     .count()
//!     .await?;
//!
//! let names: Vec<String> = client
//!     .query("SELECT name FROM users ORDER BY id")
//!     .and_then(|row| async move { Ok(row.get_as::<String, _>(0)?.unwrap_or_default()) })
//!     .try_collect()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! `DatabaseClient` is `Send + Sync` and cheap to clone; clones share the
//! memoized provider. Streams are `Send` and may be moved to other tasks.

/// Client facade and the `QueryRunner` trait.
pub mod client;

/// Connection configuration, credentials, and the memoizing connection source.
pub mod connection;

/// Schema migration gateway over sqlx migrations.
pub mod migration;

/// Execution observers for statement failures and completions.
pub mod observer;

/// Live connection providers (SQLite, PostgreSQL).
pub mod provider;

pub mod row;

pub mod statement;

/// Lazily executed, cancellable result streams.
pub mod stream;

/// Value model and driver binding/decoding.
pub mod types;

pub mod update;

pub use client::{ClientBuilder, DatabaseClient, QueryRunner};
pub use connection::{
    ConnectionConfig, ConnectionDescriptor, ConnectionSource, Credentials, PoolConfig,
    RetryConfig,
};
pub use migration::{sqlx_migration_factory, MigrationFactory, MigrationTool, SqlxMigrationTool};
pub use observer::{ExecutionObserver, TracingObserver};
pub use provider::{Backend, ConnectionProvider, ProviderFactory, SqlxProviderFactory};
pub use row::{ColumnIndex, Row};
pub use statement::Statement;
pub use stream::{KeyStream, ResultStream, RowStream};
pub use types::{FromValue, Value};
pub use update::UpdateExecution;

#[cfg(feature = "postgres")]
pub use provider::PostgresProvider;
#[cfg(feature = "sqlite")]
pub use provider::SqliteProvider;

pub use tokio_util::sync::CancellationToken;

pub use ouroboros_common::{DataAccessError, ExecutionErrorKind, Result};
