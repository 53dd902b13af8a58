//! Cold, cancellable result streams.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use async_stream::try_stream;
use futures::future::Future;
use futures::stream::{BoxStream, FusedStream, Stream, StreamExt};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::connection::ConnectionSource;
use crate::observer::ExecutionObserver;
use crate::provider::ConnectionProvider;
use crate::{Result, Row, Statement};

/// Stream of query rows.
pub type RowStream = ResultStream<Row>;

/// Stream of generated keys.
pub type KeyStream = ResultStream<i64>;

/// A lazily executed, single-pass stream of statement results.
///
/// Nothing runs until the first poll. The stream terminates after the first
/// error item, which is reported to the observer exactly once before it is
/// yielded. Completion is reported with the number of items delivered.
///
/// Dropping the stream, calling [`ResultStream::cancel`], or firing an
/// attached [`CancellationToken`] drops the underlying driver stream, which
/// returns its connection to the pool. A cancelled stream yields nothing
/// further, neither items nor errors.
pub struct ResultStream<T> {
    statement: Arc<Statement>,
    inner: Option<BoxStream<'static, Result<T>>>,
    observer: Arc<dyn ExecutionObserver>,
    cancellation: Option<Pin<Box<WaitForCancellationFutureOwned>>>,
    started: Option<Instant>,
    yielded: u64,
}

impl<T> ResultStream<T> {
    pub fn new(
        statement: Arc<Statement>,
        inner: BoxStream<'static, Result<T>>,
        observer: Arc<dyn ExecutionObserver>,
    ) -> Self {
        Self {
            statement,
            inner: Some(inner),
            observer,
            cancellation: None,
            started: None,
            yielded: 0,
        }
    }

    /// Ends the stream when `token` is cancelled.
    ///
    /// The driver stream is released on the next poll after cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(Box::pin(token.cancelled_owned()));
        self
    }

    /// Stops the stream now and releases the in-flight driver resources.
    pub fn cancel(&mut self) {
        self.release();
    }

    /// True once the stream has finished, failed, or been cancelled.
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    fn release(&mut self) {
        self.inner = None;
        self.cancellation = None;
    }
}

impl<T: Send + 'static> ResultStream<T> {
    /// Builds a stream that resolves `source` on first poll and then drains
    /// whatever `open` starts on the resolved provider.
    pub(crate) fn deferred<F>(
        source: Arc<ConnectionSource>,
        statement: Arc<Statement>,
        observer: Arc<dyn ExecutionObserver>,
        open: F,
    ) -> Self
    where
        F: FnOnce(&dyn ConnectionProvider, Arc<Statement>) -> BoxStream<'static, Result<T>>
            + Send
            + 'static,
    {
        let pending = statement.clone();
        let inner = try_stream! {
            let provider = source.resolve().await?;
            let mut results = open(provider.as_ref(), pending);
            while let Some(item) = results.next().await {
                yield item?;
            }
        };
        Self::new(statement, inner.boxed(), observer)
    }
}

impl<T> Stream for ResultStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(cancelled) = this.cancellation.as_mut() {
            if cancelled.as_mut().poll(cx).is_ready() {
                this.release();
                return Poll::Ready(None);
            }
        }

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        let started = *this.started.get_or_insert_with(Instant::now);

        match inner.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(item))) => {
                this.yielded += 1;
                Poll::Ready(Some(Ok(item)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.release();
                this.observer.on_error(&this.statement, &err);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.release();
                this.observer
                    .on_complete(&this.statement, started.elapsed(), this.yielded);
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(inner) => (0, inner.size_hint().1),
            None => (0, Some(0)),
        }
    }
}

impl<T> FusedStream for ResultStream<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl<T> fmt::Debug for ResultStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream")
            .field("statement", &self.statement.preview())
            .field("released", &self.is_released())
            .field("yielded", &self.yielded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use crate::{DataAccessError, ExecutionErrorKind};
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ReleaseGuard(Arc<AtomicBool>);

    impl Drop for ReleaseGuard {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Yields 1 and 2, then never finishes; flags `released` when dropped.
    fn endless(released: Arc<AtomicBool>) -> BoxStream<'static, Result<i64>> {
        async_stream::try_stream! {
            let _guard = ReleaseGuard(released);
            yield 1;
            yield 2;
            futures::future::pending::<()>().await;
        }
        .boxed()
    }

    fn statement() -> Arc<Statement> {
        Arc::new(Statement::new("SELECT n FROM numbers", vec![]))
    }

    #[tokio::test]
    async fn test_yields_items_then_reports_completion() {
        let observer = Arc::new(RecordingObserver::default());
        let inner = stream::iter(vec![Ok(1i64), Ok(2), Ok(3)]).boxed();
        let stream = ResultStream::new(statement(), inner, observer.clone());

        let items: Vec<i64> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(observer.error_count(), 0);
        assert_eq!(
            observer.completions.lock().unwrap().as_slice(),
            &[("SELECT n FROM numbers".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let observer = Arc::new(RecordingObserver::default());
        let mut stream = ResultStream::<i64>::new(statement(), stream::empty().boxed(), observer.clone());

        assert!(stream.next().await.is_none());
        assert!(stream.is_terminated());
        assert_eq!(observer.completion_count(), 1);
    }

    #[tokio::test]
    async fn test_error_terminates_and_is_observed_once() {
        let observer = Arc::new(RecordingObserver::default());
        let inner = stream::iter(vec![
            Ok(1i64),
            Err(DataAccessError::execution(ExecutionErrorKind::Database, "boom")),
            Ok(2),
        ])
        .boxed();
        let mut stream = ResultStream::new(statement(), inner, observer.clone());

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(stream.next().await.unwrap().unwrap_err().is_query_execution());
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());

        assert_eq!(observer.error_count(), 1);
        assert_eq!(observer.completion_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_releases_inner_stream() {
        let released = Arc::new(AtomicBool::new(false));
        let observer = Arc::new(RecordingObserver::default());
        let mut stream = ResultStream::new(statement(), endless(released.clone()), observer.clone());

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert!(!released.load(Ordering::SeqCst));

        stream.cancel();

        assert!(released.load(Ordering::SeqCst));
        assert!(stream.is_released());
        assert!(stream.next().await.is_none());
        assert_eq!(observer.error_count(), 0);
        assert_eq!(observer.completion_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_inner_stream() {
        let released = Arc::new(AtomicBool::new(false));
        let observer = Arc::new(RecordingObserver::default());
        let mut stream = ResultStream::new(statement(), endless(released.clone()), observer);

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        drop(stream);

        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_token_cancellation_ends_pending_stream() {
        let released = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::new();
        let observer = Arc::new(RecordingObserver::default());
        let mut stream = ResultStream::new(statement(), endless(released.clone()), observer.clone())
            .with_cancellation(token.clone());

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            token.cancel();
        });

        // The inner stream is pending forever; only the token can end it.
        assert!(stream.next().await.is_none());
        canceller.await.unwrap();

        assert!(released.load(Ordering::SeqCst));
        assert!(stream.is_released());
        assert_eq!(observer.error_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_before_first_poll() {
        let observer = Arc::new(RecordingObserver::default());
        let token = CancellationToken::new();
        token.cancel();

        let inner = stream::iter(vec![Ok(1i64)]).boxed();
        let mut stream = ResultStream::new(statement(), inner, observer).with_cancellation(token);

        assert!(stream.next().await.is_none());
    }
}
