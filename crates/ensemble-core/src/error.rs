//! The closed error taxonomy shared by every ensemble subsystem.
//!
//! Every provider call, cache lookup, and routing decision eventually
//! produces an [`EnsembleError`]. Keeping the set closed (rather than a
//! generic `Application(E)` wrapper) lets the circuit breaker and retry
//! executor classify errors without any per-caller configuration.

use std::fmt;
use std::time::Duration;

/// Errors produced anywhere in the ensemble pipeline: provider transport,
/// admission control, cache, routing, and voting.
#[derive(Debug, Clone)]
pub enum EnsembleError {
    /// The provider did not respond within the configured deadline.
    Timeout { after: Duration },

    /// A transport-level failure talking to the provider (DNS, TCP, TLS).
    Network { detail: String },

    /// The provider responded with a rate-limit status.
    RateLimited { retry_after: Option<Duration> },

    /// The provider responded with a 5xx status.
    Provider5xx { status: u16 },

    /// The provider returned a response that could not be parsed or was
    /// missing required fields.
    ProviderInvalidPayload { detail: String },

    /// The provider rejected the request's credentials.
    Auth { detail: String },

    /// The circuit breaker for this (provider, model) pair is open.
    BreakerOpen { model: String },

    /// The caller supplied a request that fails validation (empty prompt,
    /// unknown role name, prompt over the configured length ceiling).
    InvalidInput { detail: String },

    /// The admission queue is at capacity and cannot accept new requests.
    QueueFull,

    /// The request-level retry budget was exhausted.
    RateExceeded,

    /// The request was cancelled, typically by a caller-supplied deadline.
    Cancelled,

    /// An invariant inside the runtime itself was violated. Never expected
    /// in normal operation; surfaced rather than silently swallowed.
    ProgrammerBug { detail: String },
}

impl fmt::Display for EnsembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnsembleError::Timeout { after } => write!(f, "timed out after {:?}", after),
            EnsembleError::Network { detail } => write!(f, "network error: {}", detail),
            EnsembleError::RateLimited { retry_after } => match retry_after {
                Some(d) => write!(f, "rate limited, retry after {:?}", d),
                None => write!(f, "rate limited"),
            },
            EnsembleError::Provider5xx { status } => write!(f, "provider returned {}", status),
            EnsembleError::ProviderInvalidPayload { detail } => {
                write!(f, "invalid provider payload: {}", detail)
            }
            EnsembleError::Auth { detail } => write!(f, "authentication failed: {}", detail),
            EnsembleError::BreakerOpen { model } => write!(f, "circuit open for {}", model),
            EnsembleError::InvalidInput { detail } => write!(f, "invalid input: {}", detail),
            EnsembleError::QueueFull => write!(f, "admission queue is full"),
            EnsembleError::RateExceeded => write!(f, "retry budget exhausted"),
            EnsembleError::Cancelled => write!(f, "request cancelled"),
            EnsembleError::ProgrammerBug { detail } => write!(f, "internal invariant violated: {}", detail),
        }
    }
}

impl std::error::Error for EnsembleError {}

impl EnsembleError {
    /// Whether the retry executor should attempt this call again.
    ///
    /// `InvalidInput`, `Auth`, `BreakerOpen`, `QueueFull`, `RateExceeded`,
    /// `Cancelled` and `ProgrammerBug` are never retried: retrying them
    /// either repeats a guaranteed failure or works against a decision
    /// another subsystem already made deliberately.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            EnsembleError::Timeout { .. }
                | EnsembleError::Network { .. }
                | EnsembleError::RateLimited { .. }
                | EnsembleError::Provider5xx { .. }
                | EnsembleError::ProviderInvalidPayload { .. }
        )
    }

    /// Whether this outcome should count as a failure for circuit breaker
    /// bookkeeping. `RateLimited` is excluded: a provider-side throttle is
    /// not evidence the provider itself is unhealthy.
    pub fn counts_toward_breaker(&self) -> bool {
        matches!(
            self,
            EnsembleError::Timeout { .. }
                | EnsembleError::Network { .. }
                | EnsembleError::Provider5xx { .. }
                | EnsembleError::ProviderInvalidPayload { .. }
        )
    }

    /// True for errors that indicate a misconfigured or malformed request
    /// rather than a transient provider or infrastructure condition.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, EnsembleError::InvalidInput { .. } | EnsembleError::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable_and_counts_toward_breaker() {
        let err = EnsembleError::Timeout {
            after: Duration::from_secs(1),
        };
        assert!(err.retryable());
        assert!(err.counts_toward_breaker());
    }

    #[test]
    fn rate_limited_is_retryable_but_not_breaker_counted() {
        let err = EnsembleError::RateLimited { retry_after: None };
        assert!(err.retryable());
        assert!(!err.counts_toward_breaker());
    }

    #[test]
    fn invalid_input_is_neither_retryable_nor_breaker_counted() {
        let err = EnsembleError::InvalidInput {
            detail: "empty prompt".into(),
        };
        assert!(!err.retryable());
        assert!(!err.counts_toward_breaker());
        assert!(err.is_caller_fault());
    }

    #[test]
    fn breaker_open_is_not_retried() {
        let err = EnsembleError::BreakerOpen {
            model: "gpt-x".into(),
        };
        assert!(!err.retryable());
    }

    #[test]
    fn display_includes_useful_detail() {
        let err = EnsembleError::Provider5xx { status: 503 };
        assert!(err.to_string().contains("503"));
    }
}
