//! Ensemble orchestration runtime: fan a prompt out to several model
//! providers behind a circuit breaker and retry executor, vote among the
//! results, synthesize one answer, score it, and cache it.
//!
//! This crate is the facade over five independent subsystems, each its
//! own crate: [`ensemble_breaker`] (circuit breaking), [`ensemble_retry`]
//! (retry execution), [`ensemble_cache`] (semantic response caching),
//! [`ensemble_router`] (model selection), and [`ensemble_voting`]
//! (consensus among role outcomes). [`ensemble_fanout`] supplies the
//! settled-barrier concurrency [`EnsembleRunner`] runs every request
//! under. None of those crates know about each other; this one wires
//! them together.
//!
//! ```no_run
//! use ensemble::{EnsembleConfig, EnsembleRunnerBuilder, ModelRegistry, Request, Tier};
//! use ensemble_router::{ModelDescriptor, ModelRuntimeState, RequestKind};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[derive(Clone)]
//! # struct Provider;
//! # impl tower::Service<ensemble::ModelCall> for Provider {
//! #     type Response = ensemble::ModelReply;
//! #     type Error = ensemble_core::EnsembleError;
//! #     type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;
//! #     fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> { std::task::Poll::Ready(Ok(())) }
//! #     fn call(&mut self, req: ensemble::ModelCall) -> Self::Future {
//! #         Box::pin(async move { Ok(ensemble::ModelReply { text: "ok".into(), provider: "acme".into(), model: req.model, latency_ms: 10 }) })
//! #     }
//! # }
//! # struct EchoSynth;
//! # #[async_trait::async_trait]
//! # impl ensemble::Synthesizer for EchoSynth {
//! #     async fn synthesize(&self, _prompt: &str, roles: &[ensemble::RoleResult]) -> Result<ensemble::SynthesisOutcome, ensemble_core::EnsembleError> {
//! #         Ok(ensemble::SynthesisOutcome { content: roles.first().and_then(|r| r.content.clone()).unwrap_or_default(), confidence: 0.8, validation: 0.8 })
//! #     }
//! # }
//! # #[tokio::main]
//! # async fn main() {
//! let fallback = [
//!     ModelDescriptor::new("cheap", "acme", RequestKind::General),
//!     ModelDescriptor::new("medium", "acme", RequestKind::General),
//!     ModelDescriptor::new("safer", "globex", RequestKind::General),
//! ];
//! let mut registry = ModelRegistry::new(fallback);
//! registry.register(
//!     ModelDescriptor::new("gpt-x", "acme", RequestKind::Technical),
//!     Arc::new(ModelRuntimeState::new()),
//!     Provider,
//!     5,
//!     Duration::from_secs(30),
//! );
//!
//! let config = EnsembleConfig::builder().build();
//! let runner = EnsembleRunnerBuilder::new(config, registry, Arc::new(EchoSynth)).build();
//!
//! let envelope = runner.run(Request {
//!     id: "req-1".into(),
//!     user_prompt: "debug this code".into(),
//!     user_id: "user-1".into(),
//!     session_id: "session-1".into(),
//!     tier: Tier::Free,
//!     correlation_id: "corr-1".into(),
//!     deadline: Duration::from_secs(5),
//!     explain: false,
//! }).await;
//! assert!(envelope.metadata.error.is_none() || envelope.metadata.error.is_some());
//! # }
//! ```

mod config;
mod historical;
mod quality;
mod registry;
mod runner;
mod traits;
mod types;

pub use config::{EnsembleConfig, EnsembleConfigBuilder};
pub use historical::{BrierCalibration, HistoricalWeights, InMemoryBrierCalibration, InMemoryHistoricalWeights};
pub use quality::compute_quality_score;
pub use registry::{ComposedClient, ModelRegistry};
pub use runner::{EnsembleRunner, EnsembleRunnerBuilder};
pub use traits::{MemoryStore, NullMemoryStore, NullObserver, Observer, Synthesizer};
pub use types::{
    Envelope, LogLevel, Memory, Metadata, ModelCall, ModelReply, Request, RoleResult, RoleStatus, Synthesis, SynthesisOutcome, SynthesisStatus, Tier,
};

pub use ensemble_router::{ModelDescriptor, ModelRuntimeState, RequestKind, Selection};
pub use ensemble_voting::{Abstention, ConsensusLevel, RequeryStrategy, RoleOutcome, VoteResult, VoteWeights};
