//! Deferred update handle.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use crate::connection::ConnectionSource;
use crate::observer::ExecutionObserver;
use crate::stream::KeyStream;
use crate::{Result, Statement};

/// A prepared-but-not-executed data-modifying statement.
///
/// Nothing runs until [`count`](Self::count) is awaited or the stream from
/// [`generated_keys`](Self::generated_keys) is polled. Each of them executes
/// the statement independently: calling both runs it twice.
pub struct UpdateExecution {
    source: Arc<ConnectionSource>,
    statement: Arc<Statement>,
    observer: Arc<dyn ExecutionObserver>,
}

impl UpdateExecution {
    pub(crate) fn new(
        source: Arc<ConnectionSource>,
        statement: Statement,
        observer: Arc<dyn ExecutionObserver>,
    ) -> Self {
        Self {
            source,
            statement: Arc::new(statement),
            observer,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Executes the statement and returns the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the connection source cannot be resolved,
    /// or `QueryExecution` if the statement fails. Failures are reported to
    /// the observer before being returned.
    #[instrument(skip(self), fields(sql = %self.statement.preview()))]
    pub async fn count(&self) -> Result<u64> {
        let started = Instant::now();

        match self.execute().await {
            Ok(rows) => {
                self.observer.on_complete(&self.statement, started.elapsed(), rows);
                Ok(rows)
            }
            Err(err) => {
                self.observer.on_error(&self.statement, &err);
                Err(err)
            }
        }
    }

    async fn execute(&self) -> Result<u64> {
        let provider = self.source.resolve().await?;
        provider.execute(&self.statement).await
    }

    /// Executes the statement requesting generated keys, yielded in
    /// generation order.
    pub fn generated_keys(&self) -> KeyStream {
        KeyStream::deferred(
            self.source.clone(),
            self.statement.clone(),
            self.observer.clone(),
            |provider, statement| provider.generated_keys(statement),
        )
    }
}

impl fmt::Debug for UpdateExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateExecution")
            .field("statement", &self.statement.preview())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionConfig;
    use crate::observer::testing::RecordingObserver;
    use crate::provider::ConnectionProvider;
    use crate::{params, DataAccessError, ExecutionErrorKind, Row};
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts executions; statements containing "fail" error out.
    #[derive(Default)]
    struct CountingProvider {
        executions: AtomicUsize,
    }

    #[async_trait]
    impl ConnectionProvider for CountingProvider {
        fn backend(&self) -> &'static str {
            "counting"
        }

        fn fetch(&self, _statement: Arc<Statement>) -> BoxStream<'static, Result<Row>> {
            stream::empty().boxed()
        }

        async fn execute(&self, statement: &Statement) -> Result<u64> {
            let n = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
            if statement.sql().contains("fail") {
                return Err(DataAccessError::execution(ExecutionErrorKind::Constraint, "check failed"));
            }
            Ok(n as u64)
        }

        fn generated_keys(&self, statement: Arc<Statement>) -> BoxStream<'static, Result<i64>> {
            let n = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
            if statement.sql().contains("fail") {
                return stream::iter(vec![Err(DataAccessError::execution(
                    ExecutionErrorKind::Constraint,
                    "check failed",
                ))])
                .boxed();
            }
            stream::iter(vec![Ok(n as i64)]).boxed()
        }
    }

    fn handle(sql: &str, provider: Arc<CountingProvider>, observer: Arc<RecordingObserver>) -> UpdateExecution {
        let source = Arc::new(ConnectionSource::new(ConnectionConfig::with_provider(provider)));
        UpdateExecution::new(source, Statement::new(sql, params![1]), observer)
    }

    #[tokio::test]
    async fn test_count_and_keys_each_execute() {
        let provider = Arc::new(CountingProvider::default());
        let observer = Arc::new(RecordingObserver::default());
        let update = handle("UPDATE counter SET n = n + ?", provider.clone(), observer.clone());

        assert_eq!(provider.executions.load(Ordering::SeqCst), 0);

        assert_eq!(update.count().await.unwrap(), 1);
        let keys: Vec<i64> = update.generated_keys().try_collect().await.unwrap();

        assert_eq!(keys, vec![2]);
        assert_eq!(provider.executions.load(Ordering::SeqCst), 2);
        assert_eq!(observer.completion_count(), 2);
    }

    #[tokio::test]
    async fn test_unpolled_keys_do_not_execute() {
        let provider = Arc::new(CountingProvider::default());
        let observer = Arc::new(RecordingObserver::default());
        let update = handle("INSERT INTO t VALUES (?)", provider.clone(), observer);

        let keys = update.generated_keys();
        drop(keys);

        assert_eq!(provider.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_count_failure_is_observed_once() {
        let provider = Arc::new(CountingProvider::default());
        let observer = Arc::new(RecordingObserver::default());
        let update = handle("UPDATE fail SET n = ?", provider, observer.clone());

        let err = update.count().await.unwrap_err();

        assert_eq!(err.execution_kind(), Some(ExecutionErrorKind::Constraint));
        assert_eq!(observer.error_count(), 1);
        assert_eq!(observer.errors.lock().unwrap()[0].0, "UPDATE fail SET n = ?");
    }

    #[tokio::test]
    async fn test_key_failure_is_observed_once() {
        let provider = Arc::new(CountingProvider::default());
        let observer = Arc::new(RecordingObserver::default());
        let update = handle("INSERT INTO fail VALUES (?)", provider, observer.clone());

        let results: Vec<Result<i64>> = update.generated_keys().collect().await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
        assert_eq!(observer.error_count(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_source_fails_on_count() {
        let observer = Arc::new(RecordingObserver::default());
        let source = Arc::new(ConnectionSource::new(ConnectionConfig::default()));
        let update = UpdateExecution::new(source, Statement::new("DELETE FROM t", vec![]), observer.clone());

        assert!(update.count().await.unwrap_err().is_configuration());
        assert_eq!(observer.error_count(), 1);
    }
}
