//! Execution observers: the logging side-channel for statement outcomes.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::{DataAccessError, Statement};

/// Receives statement outcomes.
///
/// `on_error` is called exactly once per failed execution, before the error
/// reaches the consumer.
pub trait ExecutionObserver: Send + Sync {
    fn on_error(&self, statement: &Statement, error: &DataAccessError);

    /// Called when an execution finishes without error. `rows` is the number
    /// of rows affected, or items yielded for streams.
    fn on_complete(&self, _statement: &Statement, _elapsed: Duration, _rows: u64) {}
}

/// Default observer that logs through `tracing`.
///
/// Failures are logged at error level with a statement preview; parameter
/// values are never logged. Completions slower than the threshold are logged
/// at warn level, the rest at debug.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    slow_threshold: Duration,
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_secs(1),
        }
    }
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }
}

impl ExecutionObserver for TracingObserver {
    fn on_error(&self, statement: &Statement, err: &DataAccessError) {
        error!(
            sql = %statement.preview(),
            params = statement.params().len(),
            error = %err,
            "Error executing statement"
        );
    }

    fn on_complete(&self, statement: &Statement, elapsed: Duration, rows: u64) {
        let elapsed_ms = elapsed.as_millis() as u64;

        if elapsed >= self.slow_threshold {
            warn!(
                sql = %statement.preview(),
                elapsed_ms = elapsed_ms,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                rows = rows,
                "Slow statement detected"
            );
        } else {
            debug!(
                sql = %statement.preview(),
                elapsed_ms = elapsed_ms,
                rows = rows,
                "Statement completed"
            );
        }
    }
}
