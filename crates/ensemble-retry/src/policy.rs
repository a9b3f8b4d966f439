use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// Determines whether a given error should be retried at all.
///
/// Callers retrying [`ensemble_core::EnsembleError`] typically install
/// `Arc::new(|e: &EnsembleError| e.retryable())` here so that caller-fault
/// and breaker-open errors fail immediately instead of burning attempts.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Combines a backoff strategy with an optional retry predicate.
///
/// Unlike [`crate::RetryConfig`], a `RetryPolicy` has no opinion on how many
/// attempts are allowed — that is [`crate::MaxAttemptsSource`]'s job, since
/// it can vary per request.
pub struct RetryPolicy<E> {
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
}

impl<E> RetryPolicy<E> {
    pub fn new(interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            interval_fn,
            retry_predicate: None,
        }
    }

    /// Sets a predicate to determine which errors should be retried.
    pub fn with_retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Checks if the given error should be retried.
    pub fn should_retry(&self, error: &E) -> bool {
        match &self.retry_predicate {
            Some(predicate) => predicate(error),
            None => true,
        }
    }

    /// Computes the delay before the next retry attempt.
    pub fn next_backoff(&self, attempt: usize) -> Duration {
        self.interval_fn.next_interval(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::FixedInterval;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    #[test]
    fn retries_all_errors_by_default() {
        let policy: RetryPolicy<TestError> =
            RetryPolicy::new(Arc::new(FixedInterval::new(Duration::from_secs(1))));

        assert!(policy.should_retry(&TestError { retryable: false }));
    }

    #[test]
    fn predicate_filters_errors() {
        let policy = RetryPolicy::new(Arc::new(FixedInterval::new(Duration::from_secs(1))))
            .with_retry_predicate(|e: &TestError| e.retryable);

        assert!(policy.should_retry(&TestError { retryable: true }));
        assert!(!policy.should_retry(&TestError { retryable: false }));
    }

    #[test]
    fn delegates_backoff_computation_to_interval_fn() {
        let policy: RetryPolicy<TestError> =
            RetryPolicy::new(Arc::new(FixedInterval::new(Duration::from_secs(2))));

        assert_eq!(policy.next_backoff(0), Duration::from_secs(2));
        assert_eq!(policy.next_backoff(1), Duration::from_secs(2));
    }
}
