//! Bounded retry for backend calls.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::error::{WorkflowError, WorkflowResult};

/// Exponential-backoff retry applied to transient backend failures only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `0` and `1` both mean "no retry".
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_attempts(3)
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self::with_attempts(1)
    }

    /// Run `operation`, retrying while it fails with a transient error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> WorkflowResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WorkflowResult<T>>,
    {
        if self.max_attempts <= 1 {
            return operation().await;
        }

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts - 1);

        operation
            .retry(backoff)
            .when(WorkflowError::is_transient)
            .notify(|err: &WorkflowError, delay: Duration| {
                log::warn!("{} failed ({}), retrying in {:?}", what, err, delay);
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicUsize::new(0);
        let result = fast(3)
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(WorkflowError::BackendUnavailable {
                        message: "down".to_string(),
                    })
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = AtomicUsize::new(0);
        let result: WorkflowResult<()> = fast(2)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WorkflowError::BackendUnavailable {
                    message: "down".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(WorkflowError::BackendUnavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: WorkflowResult<()> = fast(5)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WorkflowError::InvalidResponse("garbage".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
