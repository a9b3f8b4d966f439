use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a limited number of calls are allowed
    /// to probe for recovery.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Point-in-time snapshot of a circuit's counters, for observability.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub time_since_state_change: std::time::Duration,
}

/// Consecutive-failure-counter circuit breaker state machine.
///
/// Unlike a rate-based breaker, this only tracks a run of consecutive
/// outcomes: `failure_threshold` failures in a row opens the circuit;
/// `success_threshold` successes in a row while half-open closes it again.
/// A single failure while half-open reopens it immediately.
pub(crate) struct Circuit {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    half_open_probes_in_flight: AtomicU32,
    opened_at: std::sync::Mutex<Instant>,
    last_transition_at: std::sync::Mutex<Instant>,
}

impl Circuit {
    pub(crate) fn new_with_atomic(state_atomic: std::sync::Arc<AtomicU8>) -> Self {
        let now = Instant::now();
        Self {
            state: AtomicU8::new(state_atomic.load(Ordering::Acquire)),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            half_open_probes_in_flight: AtomicU32::new(0),
            opened_at: std::sync::Mutex::new(now),
            last_transition_at: std::sync::Mutex::new(now),
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: CircuitState, sync: &std::sync::Arc<AtomicU8>) {
        self.state.store(state as u8, Ordering::Release);
        sync.store(state as u8, Ordering::Release);
        *self.last_transition_at.lock().unwrap() = Instant::now();
    }

    /// Returns `true` if a call may proceed, transitioning Open -> HalfOpen
    /// when the wait duration has elapsed.
    pub(crate) fn try_acquire<Res, Err>(
        &self,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                let permitted = self.half_open_probes_in_flight.fetch_update(
                    Ordering::AcqRel,
                    Ordering::Acquire,
                    |n| {
                        if n < config.permitted_calls_in_half_open as u32 {
                            Some(n + 1)
                        } else {
                            None
                        }
                    },
                );
                permitted.is_ok()
            }
            CircuitState::Open => {
                let elapsed = self.opened_at.lock().unwrap().elapsed();
                if elapsed >= config.wait_duration_in_open {
                    self.transition_to(CircuitState::HalfOpen, config, sync, events);
                    self.half_open_probes_in_flight.store(1, Ordering::Release);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub(crate) fn record_success<Res, Err>(
        &self,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) {
        self.consecutive_failures.store(0, Ordering::Release);
        match self.state() {
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight.fetch_sub(1, Ordering::AcqRel);
                let successes = self.consecutive_successes.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= config.success_threshold_half_open {
                    self.transition_to(CircuitState::Closed, config, sync, events);
                }
            }
            CircuitState::Closed => {
                self.consecutive_successes.store(0, Ordering::Release);
            }
            CircuitState::Open => {}
        }
    }

    pub(crate) fn record_failure<Res, Err>(
        &self,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) {
        self.consecutive_successes.store(0, Ordering::Release);
        match self.state() {
            CircuitState::HalfOpen => {
                self.half_open_probes_in_flight.fetch_sub(1, Ordering::AcqRel);
                self.transition_to(CircuitState::Open, config, sync, events);
            }
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= config.failure_threshold {
                    self.transition_to(CircuitState::Open, config, sync, events);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to<Res, Err>(
        &self,
        to: CircuitState,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) {
        let from = self.state();
        if from == to {
            return;
        }
        self.set_state(to, sync);
        if to == CircuitState::Open {
            *self.opened_at.lock().unwrap() = Instant::now();
        }
        self.consecutive_failures.store(0, Ordering::Release);
        self.consecutive_successes.store(0, Ordering::Release);

        #[cfg(feature = "tracing")]
        tracing::debug!(breaker = %config.name, ?from, ?to, "circuit breaker state transition");

        #[cfg(feature = "metrics")]
        {
            counter!("circuitbreaker_transitions_total", "breaker" => config.name.clone()).increment(1);
            gauge!("circuitbreaker_state", "breaker" => config.name.clone()).set(to as u8 as f64);
        }

        events.emit(&CircuitBreakerEvent::StateTransition {
            name: config.name.clone(),
            from_state: from,
            to_state: to,
            timestamp: Instant::now(),
        });
    }

    pub(crate) fn force_open<Res, Err>(
        &self,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) {
        self.transition_to(CircuitState::Open, config, sync, events);
    }

    pub(crate) fn force_closed<Res, Err>(
        &self,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) {
        self.transition_to(CircuitState::Closed, config, sync, events);
    }

    pub(crate) fn reset<Res, Err>(
        &self,
        config: &CircuitBreakerConfig<Res, Err>,
        sync: &std::sync::Arc<AtomicU8>,
        events: &ensemble_core::EventListeners<CircuitBreakerEvent>,
    ) {
        self.force_closed(config, sync, events);
        self.half_open_probes_in_flight.store(0, Ordering::Release);
    }

    pub(crate) fn metrics(&self) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state(),
            consecutive_failures: self.consecutive_failures.load(Ordering::Acquire),
            consecutive_successes: self.consecutive_successes.load(Ordering::Acquire),
            time_since_state_change: self.last_transition_at.lock().unwrap().elapsed(),
        }
    }
}
