//! Events emitted by a [`crate::Retry`] instance.

use ensemble_core::EnsembleEvent;
use std::time::{Duration, Instant};

/// An event emitted by the retry executor over the lifetime of a call.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retry attempt is about to be made.
    Retry {
        name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded, either on the first try or after retries.
    Success {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The operation failed after exhausting all retry attempts.
    Error {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// An error occurred but was not retried, filtered out by the retry predicate.
    IgnoredError { name: String, timestamp: Instant },
    /// A retry was skipped because the retry budget was exhausted.
    BudgetExhausted {
        name: String,
        timestamp: Instant,
        attempt: usize,
    },
}

impl EnsembleEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Error { .. } => "error",
            RetryEvent::IgnoredError { .. } => "ignored_error",
            RetryEvent::BudgetExhausted { .. } => "budget_exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. }
            | RetryEvent::BudgetExhausted { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retry { name, .. }
            | RetryEvent::Success { name, .. }
            | RetryEvent::Error { name, .. }
            | RetryEvent::IgnoredError { name, .. }
            | RetryEvent::BudgetExhausted { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_distinct() {
        let now = Instant::now();
        let retry = RetryEvent::Retry {
            name: "gpt-x".to_string(),
            timestamp: now,
            attempt: 1,
            delay: Duration::from_secs(1),
        };
        assert_eq!(retry.event_type(), "retry");
        assert_eq!(retry.source_name(), "gpt-x");

        let success = RetryEvent::Success {
            name: "gpt-x".to_string(),
            timestamp: now,
            attempts: 2,
        };
        assert_eq!(success.event_type(), "success");

        let error = RetryEvent::Error {
            name: "gpt-x".to_string(),
            timestamp: now,
            attempts: 3,
        };
        assert_eq!(error.event_type(), "error");

        let ignored = RetryEvent::IgnoredError {
            name: "gpt-x".to_string(),
            timestamp: now,
        };
        assert_eq!(ignored.event_type(), "ignored_error");
    }
}
