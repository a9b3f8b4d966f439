//! Per-model circuit breaker for the ensemble orchestration runtime.
//!
//! Each `(provider, model)` pair a [`crate::CircuitBreaker`] is wound around
//! trips independently: `N` consecutive failures opens the circuit,
//! rejecting calls immediately until a cooldown elapses, after which a
//! limited number of half-open probes decide whether to close again or
//! reopen on the first failure. This is deliberately simpler than a
//! rate-based sliding window — the runtime only needs "is this model
//! currently worth trying", not a smoothed failure rate.
//!
//! ## States
//! - **Closed**: normal operation, all calls pass through.
//! - **Open**: calls are rejected immediately with [`CircuitBreakerError::OpenCircuit`].
//! - **Half-Open**: a small number of probe calls are let through to test recovery.
//!
//! ```rust
//! use ensemble_breaker::CircuitBreakerLayer;
//! use tower::{Layer, service_fn};
//!
//! # async fn example() {
//! let layer: CircuitBreakerLayer<String, std::io::Error> =
//!     CircuitBreakerLayer::standard().name("gpt-x").build();
//! let svc = service_fn(|req: String| async move { Ok::<String, std::io::Error>(req) });
//! let mut breaker = layer.layer(svc);
//! # }
//! ```

mod circuit;
mod classifier;
mod config;
mod error;
mod events;
mod layer;

use circuit::Circuit;
pub use circuit::{CircuitMetrics, CircuitState};
pub use classifier::{DefaultClassifier, FailureClassifier, FnClassifier};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use layer::CircuitBreakerLayer;

use ensemble_core::EventListeners;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::AtomicU8;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tower::Service;

pub(crate) type SharedFailureClassifierFn<Res, Err> =
    dyn Fn(&Result<Res, Err>) -> bool + Send + Sync;
pub(crate) type SharedFailureClassifier<Res, Err> = Arc<SharedFailureClassifierFn<Res, Err>>;

/// A Tower [`Service`] that guards an inner model-calling service with a
/// circuit breaker.
pub struct CircuitBreaker<S, Res, Err> {
    inner: S,
    circuit: Arc<Circuit>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig<Res, Err>>,
}

impl<S: Clone, Res, Err> Clone for CircuitBreaker<S, Res, Err> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            circuit: Arc::clone(&self.circuit),
            state_atomic: Arc::clone(&self.state_atomic),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Res, Err> CircuitBreaker<S, Res, Err> {
    pub(crate) fn new(inner: S, config: Arc<CircuitBreakerConfig<Res, Err>>) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            inner,
            circuit: Arc::new(Circuit::new_with_atomic(Arc::clone(&state_atomic))),
            state_atomic,
            config,
        }
    }

    /// Forces the circuit into the open state, e.g. from an external health
    /// check.
    pub async fn force_open(&self) {
        self.circuit
            .force_open(&self.config, &self.state_atomic, &self.config.event_listeners);
    }

    /// Forces the circuit closed, clearing its failure streak.
    pub async fn force_closed(&self) {
        self.circuit
            .force_closed(&self.config, &self.state_atomic, &self.config.event_listeners);
    }

    /// Resets the circuit to closed and clears in-flight half-open probes.
    pub async fn reset(&self) {
        self.circuit
            .reset(&self.config, &self.state_atomic, &self.config.event_listeners);
    }

    /// Returns a snapshot of the circuit's counters.
    pub fn metrics(&self) -> CircuitMetrics {
        self.circuit.metrics()
    }

    /// Returns the current state without requiring async access. Safe to
    /// call from the router's scoring loop, which runs synchronously.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Returns a lightweight, `Clone`-able handle onto this breaker's state.
    ///
    /// A registry that keeps one breaker per model can't store
    /// `CircuitBreaker<S, Res, Err>` values in a single map, since `S` (and
    /// often `Res`/`Err`) differs per model. `CircuitHandle` erases all of
    /// that: it keeps only the atomic the breaker already uses for
    /// [`Self::state_sync`], so availability can be checked without holding
    /// the full generic type.
    pub fn handle(&self) -> CircuitHandle {
        CircuitHandle {
            state_atomic: Arc::clone(&self.state_atomic),
        }
    }
}

/// A cheap, type-erased handle onto a [`CircuitBreaker`]'s state.
///
/// Obtained via [`CircuitBreaker::handle`]. Carries none of the breaker's
/// generic parameters, so a map keyed by model id can hold one of these per
/// model regardless of what each model's underlying service type is.
#[derive(Clone)]
pub struct CircuitHandle {
    state_atomic: Arc<AtomicU8>,
}

impl CircuitHandle {
    /// Returns the current state without requiring async access.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(std::sync::atomic::Ordering::Acquire))
    }

    /// Returns `true` unless the circuit is currently open.
    pub fn is_available(&self) -> bool {
        self.state_sync() != CircuitState::Open
    }
}

impl<S, Req, Res, Err> Service<Req> for CircuitBreaker<S, Res, Err>
where
    S: Service<Req, Response = Res, Error = Err>,
    S::Future: Send + 'static,
    Res: Send + 'static,
    Err: Send + 'static,
{
    type Response = Res;
    type Error = CircuitBreakerError<Err>;
    type Future = Pin<Box<dyn Future<Output = Result<Res, CircuitBreakerError<Err>>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.inner.poll_ready(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Ready(Err(e)) => Poll::Ready(Err(CircuitBreakerError::Inner(e))),
            Poll::Pending => Poll::Pending,
        }
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let name = self.config.name.clone();
        if !self
            .circuit
            .try_acquire(&self.config, &self.state_atomic, &self.config.event_listeners)
        {
            #[cfg(feature = "metrics")]
            metrics::counter!("circuitbreaker_calls_total", "breaker" => name.clone(), "outcome" => "rejected")
                .increment(1);
            self.config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
                name,
                timestamp: std::time::Instant::now(),
            });
            return Box::pin(async { Err(CircuitBreakerError::OpenCircuit) });
        }

        #[cfg(feature = "metrics")]
        metrics::counter!("circuitbreaker_calls_total", "breaker" => name.clone(), "outcome" => "permitted")
            .increment(1);
        self.config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
            name: name.clone(),
            state: self.circuit.state(),
            timestamp: std::time::Instant::now(),
        });

        let future = self.inner.call(req);
        let circuit = Arc::clone(&self.circuit);
        let state_atomic = Arc::clone(&self.state_atomic);
        let config = Arc::clone(&self.config);
        let started = std::time::Instant::now();

        Box::pin(async move {
            let result = future.await;
            let is_failure = (config.failure_classifier)(&result);

            if is_failure {
                circuit.record_failure(&config, &state_atomic, &config.event_listeners);
                config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
                    name: config.name.clone(),
                    state: circuit.state(),
                    consecutive_failures: circuit.metrics().consecutive_failures,
                    timestamp: std::time::Instant::now(),
                });
            } else {
                circuit.record_success(&config, &state_atomic, &config.event_listeners);
                config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
                    name: config.name.clone(),
                    state: circuit.state(),
                    latency: started.elapsed(),
                    timestamp: std::time::Instant::now(),
                });
            }

            result.map_err(CircuitBreakerError::Inner)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::{service_fn, Layer};

    #[tokio::test]
    async fn opens_after_threshold_consecutive_failures() {
        let layer = CircuitBreakerLayer::standard()
            .failure_threshold(3)
            .name("test")
            .build();
        let svc = service_fn(|_: ()| async { Err::<(), &'static str>("boom") });
        let mut breaker = layer.layer(svc);

        for _ in 0..3 {
            assert!(matches!(
                breaker.call(()).await,
                Err(CircuitBreakerError::Inner("boom"))
            ));
        }

        assert_eq!(breaker.state_sync(), CircuitState::Open);
        assert!(matches!(
            breaker.call(()).await,
            Err(CircuitBreakerError::OpenCircuit)
        ));
    }

    #[tokio::test]
    async fn success_resets_consecutive_failure_count() {
        let mut calls = 0u32;
        let layer = CircuitBreakerLayer::standard().failure_threshold(3).build();
        let svc = service_fn(move |req: bool| {
            calls += 1;
            async move {
                if req {
                    Err::<(), &'static str>("boom")
                } else {
                    Ok(())
                }
            }
        });
        let mut breaker = layer.layer(svc);

        let _ = breaker.call(true).await;
        let _ = breaker.call(true).await;
        let _ = breaker.call(false).await; // resets streak
        let _ = breaker.call(true).await;
        let _ = breaker.call(true).await;

        assert_eq!(breaker.state_sync(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_probe_failure_reopens_immediately() {
        let layer = CircuitBreakerLayer::standard()
            .failure_threshold(1)
            .wait_duration_in_open(std::time::Duration::from_millis(1))
            .build();
        let svc = service_fn(|_: ()| async { Err::<(), &'static str>("boom") });
        let mut breaker = layer.layer(svc);

        let _ = breaker.call(()).await;
        assert_eq!(breaker.state_sync(), CircuitState::Open);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let _ = breaker.call(()).await; // half-open probe, also fails
        assert_eq!(breaker.state_sync(), CircuitState::Open);
    }

    #[tokio::test]
    async fn half_open_closes_after_success_threshold() {
        let layer = CircuitBreakerLayer::standard()
            .failure_threshold(1)
            .success_threshold_half_open(2)
            .wait_duration_in_open(std::time::Duration::from_millis(1))
            .permitted_calls_in_half_open(2)
            .build();
        let svc = service_fn(|succeed: bool| async move {
            if succeed {
                Ok::<(), &'static str>(())
            } else {
                Err("boom")
            }
        });
        let mut breaker = layer.layer(svc);

        let _ = breaker.call(false).await;
        assert_eq!(breaker.state_sync(), CircuitState::Open);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let _ = breaker.call(true).await;
        let _ = breaker.call(true).await;
        assert_eq!(breaker.state_sync(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn force_open_and_reset_override_state() {
        let layer: CircuitBreakerLayer<(), &'static str> = CircuitBreakerLayer::standard().build();
        let svc = service_fn(|_: ()| async { Ok::<(), &'static str>(()) });
        let breaker = layer.layer(svc);

        breaker.force_open().await;
        assert_eq!(breaker.state_sync(), CircuitState::Open);

        breaker.reset().await;
        assert_eq!(breaker.state_sync(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn custom_classifier_excludes_rate_limits_from_breaker_count() {
        #[derive(Debug, Clone, PartialEq)]
        enum FakeErr {
            RateLimited,
            Network,
        }

        let layer = CircuitBreakerLayer::standard()
            .failure_threshold(2)
            .failure_classifier(|res: &Result<(), FakeErr>| {
                !matches!(res, Err(FakeErr::RateLimited))
            })
            .build();
        let svc = service_fn(|err: FakeErr| async move { Err::<(), FakeErr>(err) });
        let mut breaker = layer.layer(svc);

        let _ = breaker.call(FakeErr::RateLimited).await;
        let _ = breaker.call(FakeErr::RateLimited).await;
        let _ = breaker.call(FakeErr::RateLimited).await;
        assert_eq!(breaker.state_sync(), CircuitState::Closed);

        let _ = breaker.call(FakeErr::Network).await;
        let _ = breaker.call(FakeErr::Network).await;
        assert_eq!(breaker.state_sync(), CircuitState::Open);
    }

    #[tokio::test]
    async fn event_listeners_observe_transitions() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let transitions = Arc::new(AtomicUsize::new(0));
        let transitions_clone = Arc::clone(&transitions);

        let mut builder = CircuitBreakerLayer::standard().failure_threshold(1);
        builder = builder.on_state_transition(move |_from, _to| {
            transitions_clone.fetch_add(1, Ordering::SeqCst);
        });
        let layer = builder.build();

        let svc = service_fn(|_: ()| async { Err::<(), &'static str>("boom") });
        let mut breaker = layer.layer(svc);
        let _ = breaker.call(()).await;

        assert_eq!(transitions.load(Ordering::SeqCst), 1);
    }
}
