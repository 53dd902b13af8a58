//! Connection configuration and the lazily resolved connection source.
//!
//! A client is configured with exactly one of two connection variants: an
//! externally managed [`ConnectionProvider`], or a (url, username, password)
//! triple from which a provider is built on first use. The configuration is
//! only validated when the source is first resolved, and the resolved
//! provider is memoized for the lifetime of the source.
//! Connection establishment retries with exponential backoff.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::provider::{ConnectionProvider, ProviderFactory, SqlxProviderFactory};
use crate::{DataAccessError, Result};

/// Default directory scanned for migration scripts.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Retry configuration for connection establishment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles delay each retry)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Creates a retry config with no retries (immediate failure).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Calculates the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay_ms = (self.initial_delay_ms as f64)
            * self.backoff_multiplier.powi(attempt as i32);

        Duration::from_millis((delay_ms as u64).min(self.max_delay_ms))
    }
}

/// Connection pool configuration, applied when a pool is built from credentials.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool.
    pub min_connections: u32,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Connection timeout in seconds.
    pub connect_timeout: u64,
    /// Maximum lifetime of a connection in seconds.
    pub max_lifetime: Option<u64>,
    /// Idle timeout in seconds.
    pub idle_timeout: Option<u64>,
    /// Retry configuration for connection establishment.
    pub retry: RetryConfig,
    /// Number of prepared statements to cache per connection.
    /// Set to 0 to disable caching. Default is 100.
    pub statement_cache_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            connect_timeout: 30,
            max_lifetime: Some(1800), // 30 minutes
            idle_timeout: Some(600),   // 10 minutes
            retry: RetryConfig::default(),
            statement_cache_capacity: 100, // SQLx default
        }
    }
}

/// The (url, username, password) connection variant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    url: String,
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A validated connection configuration: exactly one variant.
#[derive(Clone)]
pub enum ConnectionDescriptor {
    /// An externally managed provider, used as-is.
    Provider(Arc<dyn ConnectionProvider>),
    /// Credentials from which a provider is constructed.
    Credentials(Credentials),
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDescriptor::Provider(provider) => f
                .debug_tuple("Provider")
                .field(&provider.backend())
                .finish(),
            ConnectionDescriptor::Credentials(credentials) => {
                f.debug_tuple("Credentials").field(credentials).finish()
            }
        }
    }
}

/// Raw connection configuration.
///
/// Fields may be under- or over-populated; [`ConnectionConfig::descriptor`]
/// enforces that exactly one variant is present.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Externally managed provider (never deserialized)
    #[serde(skip)]
    pub provider: Option<Arc<dyn ConnectionProvider>>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool: PoolConfig,
    /// Directory holding migration scripts
    pub migrations: PathBuf,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            provider: None,
            url: None,
            username: None,
            password: None,
            pool: PoolConfig::default(),
            migrations: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("provider", &self.provider.as_ref().map(|p| p.backend()))
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pool", &self.pool)
            .field("migrations", &self.migrations)
            .finish()
    }
}

impl ConnectionConfig {
    /// Configuration for an externally managed provider.
    pub fn with_provider(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Default::default()
        }
    }

    /// Configuration from a (url, username, password) triple.
    pub fn with_credentials(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Create connection configuration from environment variables.
    ///
    /// Reads `DATABASE_URL`, `DATABASE_USERNAME`, `DATABASE_PASSWORD`,
    /// `DATABASE_MAX_CONNECTIONS` and `DATABASE_MIGRATIONS`. Missing
    /// credential variables are left unset and reported when the
    /// configuration is resolved.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `DATABASE_MAX_CONNECTIONS` is not a number.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            url: std::env::var("DATABASE_URL").ok(),
            username: std::env::var("DATABASE_USERNAME").ok(),
            password: std::env::var("DATABASE_PASSWORD").ok(),
            ..Default::default()
        };

        if let Ok(max) = std::env::var("DATABASE_MAX_CONNECTIONS") {
            config.pool.max_connections = max.parse().map_err(|_| {
                DataAccessError::Configuration(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive integer, got '{}'",
                    max
                ))
            })?;
        }

        if let Ok(dir) = std::env::var("DATABASE_MIGRATIONS") {
            config.migrations = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations = dir.into();
        self
    }

    /// Validates that exactly one connection variant is configured.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if both a provider and any credential field
    /// are set, if neither is set, or if the credential triple is partial.
    pub fn descriptor(&self) -> Result<ConnectionDescriptor> {
        let credential_fields = [&self.url, &self.username, &self.password];
        let populated = credential_fields.iter().filter(|f| f.is_some()).count();

        match (&self.provider, &self.url, &self.username, &self.password) {
            (Some(_), ..) if populated > 0 => Err(DataAccessError::Configuration(
                "Both a connection provider and connection credentials were supplied; configure exactly one"
                    .to_string(),
            )),
            (Some(provider), ..) => Ok(ConnectionDescriptor::Provider(provider.clone())),
            (None, Some(url), Some(username), Some(password)) => Ok(
                ConnectionDescriptor::Credentials(Credentials::new(url, username, password)),
            ),
            (None, ..) if populated == 0 => Err(DataAccessError::Configuration(
                "No connection provider or connection credentials were supplied".to_string(),
            )),
            (None, url, username, _) => {
                let missing: Vec<&str> = [("url", url.is_none()), ("username", username.is_none()), ("password", self.password.is_none())]
                    .into_iter()
                    .filter(|(_, absent)| *absent)
                    .map(|(name, _)| name)
                    .collect();
                Err(DataAccessError::Configuration(format!(
                    "Incomplete connection credentials: missing {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Resolves a [`ConnectionConfig`] into a live provider, once.
///
/// Resolution is deferred until the first query or update is consumed.
/// Concurrent first resolutions share a single provider construction; a
/// failed resolution is not cached and is attempted again by the next
/// consumer. The resolved provider is never closed by the source.
pub struct ConnectionSource {
    config: ConnectionConfig,
    factory: Arc<dyn ProviderFactory>,
    resolved: OnceCell<Arc<dyn ConnectionProvider>>,
}

impl fmt::Debug for ConnectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSource")
            .field("config", &self.config)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl ConnectionSource {
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_factory(config, Arc::new(SqlxProviderFactory))
    }

    /// Creates a source whose credentials are turned into providers by `factory`.
    pub fn with_factory(config: ConnectionConfig, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            config,
            factory,
            resolved: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn factory(&self) -> &Arc<dyn ProviderFactory> {
        &self.factory
    }

    /// Validates the configuration without resolving a provider.
    pub fn descriptor(&self) -> Result<ConnectionDescriptor> {
        self.config.descriptor()
    }

    /// True once a provider has been resolved and memoized.
    pub fn is_resolved(&self) -> bool {
        self.resolved.initialized()
    }

    /// Returns the live provider, building it on first call.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration does not hold exactly one
    /// connection variant, or whatever the provider factory reports.
    pub async fn resolve(&self) -> Result<Arc<dyn ConnectionProvider>> {
        let provider = self
            .resolved
            .get_or_try_init(|| self.resolve_uncached())
            .await?;
        Ok(provider.clone())
    }

    #[instrument(skip(self))]
    async fn resolve_uncached(&self) -> Result<Arc<dyn ConnectionProvider>> {
        match self.descriptor()? {
            ConnectionDescriptor::Provider(provider) => {
                debug!(backend = provider.backend(), "Using supplied connection provider");
                Ok(provider)
            }
            ConnectionDescriptor::Credentials(credentials) => {
                info!(url = %redact_url(credentials.url()), "Building connection provider from credentials");
                self.factory.connect(&credentials, &self.config.pool).await
            }
        }
    }
}

/// Strips any userinfo (`user:password@`) from a URL for logging.
///
/// Only the authority is searched for `@`; path, query and fragment are kept.
pub(crate) fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let authority_end = url[authority_start..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |end| authority_start + end);

    match url[authority_start..authority_end].rfind('@') {
        Some(at) => format!(
            "{}<redacted>{}",
            &url[..authority_start],
            &url[authority_start + at..]
        ),
        None => url.to_string(),
    }
}

/// Attempts to connect with exponential backoff retry.
pub(crate) async fn connect_with_retry<T, F, Fut>(retry: &RetryConfig, mut connect: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut last_error = None;

    for attempt in 0..=retry.max_retries {
        match connect().await {
            Ok(pool) => {
                if attempt > 0 {
                    info!(attempt = attempt, "Connection established after retry");
                }
                return Ok(pool);
            }
            Err(e) => {
                if attempt < retry.max_retries {
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt,
                        max_retries = retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Connection failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    // All retries exhausted
    Err(last_error.map(DataAccessError::from).unwrap_or_else(|| {
        DataAccessError::execution(crate::ExecutionErrorKind::Connection, "Connection failed")
    }))
}
