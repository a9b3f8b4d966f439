//! Events emitted by a [`crate::CircuitBreaker`] instance.

use ensemble_core::EnsembleEvent;
use std::time::{Duration, Instant};

use crate::CircuitState;

/// An event emitted by a circuit breaker over its lifetime.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit moved from one state to another.
    StateTransition {
        name: String,
        from_state: CircuitState,
        to_state: CircuitState,
        timestamp: Instant,
    },
    /// A call was allowed through.
    CallPermitted { name: String, state: CircuitState, timestamp: Instant },
    /// A call was rejected because the circuit is open.
    CallRejected { name: String, timestamp: Instant },
    /// A call succeeded.
    SuccessRecorded {
        name: String,
        state: CircuitState,
        latency: Duration,
        timestamp: Instant,
    },
    /// A call failed and counted toward the breaker.
    FailureRecorded {
        name: String,
        state: CircuitState,
        consecutive_failures: u32,
        timestamp: Instant,
    },
}

impl EnsembleEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { name, .. }
            | CircuitBreakerEvent::CallPermitted { name, .. }
            | CircuitBreakerEvent::CallRejected { name, .. }
            | CircuitBreakerEvent::SuccessRecorded { name, .. }
            | CircuitBreakerEvent::FailureRecorded { name, .. } => name,
        }
    }
}
