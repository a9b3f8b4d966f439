//! Binds `ModelDescriptor`s to real, composed model-calling services and
//! wires breaker availability into [`ensemble_router::ModelRouter::select`].
//!
//! [`ensemble_router::ModelRouter`] takes an injected `is_available`
//! closure rather than importing breaker internals, so it has no
//! compile-time dependency on this crate's breaker stack. `ModelRegistry`
//! is the piece that actually owns both sides and connects them: one
//! breaker → retry → client stack per model, type-erased into a
//! [`tower::util::BoxCloneService`] so models with different underlying
//! client types can share one map.

use crate::types::{ModelCall, ModelReply};
use ensemble_breaker::{CircuitBreakerError, CircuitBreakerLayer, CircuitHandle};
use ensemble_core::EnsembleError;
use ensemble_retry::RetryLayer;
use ensemble_router::{ModelDescriptor, ModelRouter, ModelRuntimeState, Selection};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceBuilder};

/// A fully composed, type-erased model client: breaker around retry
/// around the caller-supplied transport, with errors collapsed back to
/// [`EnsembleError`].
pub type ComposedClient = BoxCloneService<ModelCall, ModelReply, EnsembleError>;

/// Owns the router plus one composed client and circuit handle per
/// registered model.
pub struct ModelRegistry {
    router: ModelRouter,
    clients: HashMap<String, ComposedClient>,
    breakers: HashMap<String, CircuitHandle>,
}

impl ModelRegistry {
    pub fn new(fallback: [ModelDescriptor; 3]) -> Self {
        Self {
            router: ModelRouter::new(fallback),
            clients: HashMap::new(),
            breakers: HashMap::new(),
        }
    }

    /// Registers a model: wraps `client` in a per-model circuit breaker
    /// and retry executor, records the breaker's handle for availability
    /// checks, and adds the descriptor to the underlying router.
    pub fn register<C>(&mut self, model: ModelDescriptor, state: Arc<ModelRuntimeState>, client: C, breaker_failure_threshold: u32, breaker_reset_timeout: Duration)
    where
        C: Service<ModelCall, Response = ModelReply, Error = EnsembleError> + Clone + Send + Sync + 'static,
        C::Future: Send + 'static,
    {
        let model_id = model.id.clone();
        let breaker_name = model_id.clone();
        let retry_name = model_id.clone();
        let map_err_model_id = model_id.clone();

        let retry_layer = RetryLayer::<ModelCall, EnsembleError>::builder()
            .max_attempts(3)
            .exponential_backoff(Duration::from_millis(100))
            .retry_on(|e: &EnsembleError| e.retryable())
            .name(retry_name)
            .build();

        let breaker_layer = CircuitBreakerLayer::builder()
            .failure_threshold(breaker_failure_threshold)
            .wait_duration_in_open(breaker_reset_timeout)
            .name(breaker_name)
            .failure_classifier(|res: &Result<ModelReply, EnsembleError>| matches!(res, Err(e) if e.counts_toward_breaker()))
            .build();

        let retried = retry_layer.layer(client);
        let breaker = breaker_layer.layer(retried);
        let handle = breaker.handle();

        let composed = ServiceBuilder::new()
            .map_err(move |e: CircuitBreakerError<EnsembleError>| match e {
                CircuitBreakerError::OpenCircuit => EnsembleError::BreakerOpen { model: map_err_model_id.clone() },
                CircuitBreakerError::Inner(inner) => inner,
            })
            .service(breaker);

        self.clients.insert(model_id.clone(), BoxCloneService::new(composed));
        self.breakers.insert(model_id.clone(), handle);
        self.router.register(model, state);
    }

    /// Selects up to `k` distinct available models for `prompt`, filtering
    /// out any whose circuit is currently open.
    pub fn select(&self, prompt: &str, tier: &str, k: usize) -> Vec<Selection> {
        self.router.select(prompt, tier, k, |model_id| self.breakers.get(model_id).map(CircuitHandle::is_available).unwrap_or(true))
    }

    /// Returns a clone of the composed client for `model_id`, if registered.
    pub fn client(&self, model_id: &str) -> Option<ComposedClient> {
        self.clients.get(model_id).cloned()
    }

    pub fn runtime_state(&self, model_id: &str) -> Option<Arc<ModelRuntimeState>> {
        self.router.runtime_state(model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_router::RequestKind;
    use std::task::{Context, Poll};
    use std::pin::Pin;
    use std::future::Future;

    #[derive(Clone)]
    struct AlwaysOk;

    impl Service<ModelCall> for AlwaysOk {
        type Response = ModelReply;
        type Error = EnsembleError;
        type Future = Pin<Box<dyn Future<Output = Result<ModelReply, EnsembleError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: ModelCall) -> Self::Future {
            Box::pin(async move {
                Ok(ModelReply {
                    text: format!("reply to {}", req.user),
                    provider: "acme".to_string(),
                    model: req.model,
                    latency_ms: 5,
                })
            })
        }
    }

    fn fallback() -> [ModelDescriptor; 3] {
        [
            ModelDescriptor::new("cheap", "acme", RequestKind::General),
            ModelDescriptor::new("medium", "acme", RequestKind::General),
            ModelDescriptor::new("safer", "globex", RequestKind::General),
        ]
    }

    #[tokio::test]
    async fn registered_model_is_callable_through_composed_stack() {
        let mut registry = ModelRegistry::new(fallback());
        registry.register(
            ModelDescriptor::new("gpt-x", "acme", RequestKind::Technical),
            Arc::new(ModelRuntimeState::new()),
            AlwaysOk,
            5,
            Duration::from_secs(30),
        );

        let mut client = registry.client("gpt-x").unwrap();
        let reply = client.call(ModelCall::new("gpt-x", "sys", "hello")).await.unwrap();
        assert_eq!(reply.text, "reply to hello");
    }

    #[test]
    fn selection_respects_registered_models() {
        let mut registry = ModelRegistry::new(fallback());
        registry.register(
            ModelDescriptor::new("gpt-x", "acme", RequestKind::Technical),
            Arc::new(ModelRuntimeState::new()),
            AlwaysOk,
            5,
            Duration::from_secs(30),
        );

        let selections = registry.select("debug this code", "free", 1);
        assert_eq!(selections[0].model.id, "gpt-x");
    }
}
