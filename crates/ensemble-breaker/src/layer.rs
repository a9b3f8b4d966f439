use crate::config::CircuitBreakerConfig;
use crate::CircuitBreaker;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that wraps a model-calling service with a consecutive-
/// failure circuit breaker.
///
/// # Example
///
/// ```rust
/// use tower::{ServiceBuilder, service_fn};
/// use ensemble_breaker::CircuitBreakerLayer;
///
/// let layer: CircuitBreakerLayer<String, std::io::Error> = CircuitBreakerLayer::builder()
///     .failure_threshold(5)
///     .name("gpt-x")
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
#[derive(Clone)]
pub struct CircuitBreakerLayer<Res, Err> {
    config: Arc<CircuitBreakerConfig<Res, Err>>,
}

impl<Res, Err> CircuitBreakerLayer<Res, Err> {
    pub(crate) fn new(config: CircuitBreakerConfig<Res, Err>) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn builder() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        crate::CircuitBreakerConfigBuilder::new()
    }

    /// Preset: opens after 5 consecutive failures, waits 30s, requires 2
    /// consecutive successes in half-open to close. Suitable for most
    /// model providers.
    pub fn standard() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        use std::time::Duration;
        Self::builder()
            .failure_threshold(5)
            .success_threshold_half_open(2)
            .wait_duration_in_open(Duration::from_secs(30))
    }

    /// Preset: opens after 3 consecutive failures for latency-sensitive
    /// paths that should fail fast.
    pub fn fast_fail() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        use std::time::Duration;
        Self::builder()
            .failure_threshold(3)
            .success_threshold_half_open(1)
            .wait_duration_in_open(Duration::from_secs(10))
    }

    /// Preset: tolerates 10 consecutive failures before opening, for
    /// providers with known transient flakiness.
    pub fn tolerant() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        use std::time::Duration;
        Self::builder()
            .failure_threshold(10)
            .success_threshold_half_open(3)
            .wait_duration_in_open(Duration::from_secs(60))
    }
}

impl<S, Res, Err> Layer<S> for CircuitBreakerLayer<Res, Err> {
    type Service = CircuitBreaker<S, Res, Err>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreaker::new(service, Arc::clone(&self.config))
    }
}
