//! `EnsembleRunner`: admits a request, fans it out to a diverse set of
//! models under a circuit breaker and retry executor, votes among the
//! results, synthesizes an answer, scores it, and caches it.

use crate::config::EnsembleConfig;
use crate::historical::{BrierCalibration, HistoricalWeights, InMemoryBrierCalibration, InMemoryHistoricalWeights};
use crate::quality::compute_quality_score;
use crate::registry::ModelRegistry;
use crate::traits::{MemoryStore, NullMemoryStore, NullObserver, Observer, Synthesizer};
use crate::types::{Envelope, LogLevel, Memory, Metadata, ModelCall, Request, RoleResult, SynthesisOutcome, Synthesis, SynthesisStatus, Tier};
use ensemble_cache::SemanticCache;
use ensemble_core::EnsembleError;
use ensemble_fanout::{fan_out, CurrentRuntime, FanoutConfig, FanoutOutcome};
use ensemble_voting::{RoleOutcome, VotingEngine};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tower::Service;

/// Maps an [`EnsembleError`] onto the kind name used in role results and
/// the returned envelope's `errorKind` field.
fn error_kind_str(error: &EnsembleError) -> &'static str {
    match error {
        EnsembleError::Timeout { .. } => "TIMEOUT",
        EnsembleError::Network { .. } => "NETWORK",
        EnsembleError::RateLimited { .. } => "RATE_LIMITED",
        EnsembleError::Provider5xx { .. } => "PROVIDER_5XX",
        EnsembleError::ProviderInvalidPayload { .. } => "PROVIDER_INVALID_PAYLOAD",
        EnsembleError::Auth { .. } => "AUTH",
        EnsembleError::BreakerOpen { .. } => "BREAKER_OPEN",
        EnsembleError::InvalidInput { .. } => "INVALID_INPUT",
        EnsembleError::QueueFull => "QUEUE_FULL",
        EnsembleError::RateExceeded => "RATE_EXCEEDED",
        EnsembleError::Cancelled => "CANCELLED",
        EnsembleError::ProgrammerBug { .. } => "PROGRAMMER_BUG",
    }
}

/// Owns every collaborator `Run` needs: the model registry, cache, voting
/// engine, and the injected memory/synthesis/observability seams.
pub struct EnsembleRunner {
    config: EnsembleConfig,
    registry: ModelRegistry,
    cache: SemanticCache,
    voting: VotingEngine,
    memory: Arc<dyn MemoryStore>,
    synthesizer: Arc<dyn Synthesizer>,
    observer: Arc<dyn Observer>,
    historical: Arc<dyn HistoricalWeights>,
    brier: Arc<dyn BrierCalibration>,
    admission: Arc<Semaphore>,
    tier_gate_free: Arc<Semaphore>,
    tier_gate_premium: Arc<Semaphore>,
    rate_limits: Mutex<HashMap<String, Vec<Instant>>>,
    executor: CurrentRuntime,
}

/// Builder for [`EnsembleRunner`]; the only required input is the
/// configured [`ModelRegistry`] and a [`Synthesizer`], since everything
/// else has a best-effort or in-memory default.
pub struct EnsembleRunnerBuilder {
    config: EnsembleConfig,
    registry: ModelRegistry,
    synthesizer: Arc<dyn Synthesizer>,
    memory: Arc<dyn MemoryStore>,
    observer: Arc<dyn Observer>,
    historical: Arc<dyn HistoricalWeights>,
    brier: Arc<dyn BrierCalibration>,
}

impl EnsembleRunnerBuilder {
    pub fn new(config: EnsembleConfig, registry: ModelRegistry, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            config,
            registry,
            synthesizer,
            memory: Arc::new(NullMemoryStore),
            observer: Arc::new(NullObserver),
            historical: Arc::new(InMemoryHistoricalWeights::new()),
            brier: Arc::new(InMemoryBrierCalibration::new()),
        }
    }

    pub fn memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = memory;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn historical(mut self, historical: Arc<dyn HistoricalWeights>) -> Self {
        self.historical = historical;
        self
    }

    pub fn brier(mut self, brier: Arc<dyn BrierCalibration>) -> Self {
        self.brier = brier;
        self
    }

    pub fn build(self) -> EnsembleRunner {
        let voting = VotingEngine::new(ensemble_voting::VotingConfig::builder().abstain_threshold(self.config.abstain_threshold).name("ensemble").build());
        EnsembleRunner {
            admission: Arc::new(Semaphore::new(self.config.max_queue)),
            tier_gate_free: Arc::new(Semaphore::new(self.config.max_concurrent_requests_free)),
            tier_gate_premium: Arc::new(Semaphore::new(self.config.max_concurrent_requests_premium)),
            cache: SemanticCache::new(self.config.cache.clone()),
            config: self.config,
            registry: self.registry,
            voting,
            memory: self.memory,
            synthesizer: self.synthesizer,
            observer: self.observer,
            historical: self.historical,
            brier: self.brier,
            rate_limits: Mutex::new(HashMap::new()),
            executor: CurrentRuntime::new(),
        }
    }
}

impl EnsembleRunner {
    fn log(&self, level: LogLevel, msg: &str, correlation_id: &str) {
        self.observer.log(level, msg, &HashMap::new(), correlation_id);
    }

    fn tier_gate(&self, tier: Tier) -> &Arc<Semaphore> {
        match tier {
            Tier::Free => &self.tier_gate_free,
            Tier::Premium => &self.tier_gate_premium,
        }
    }

    /// Step 2: non-empty prompt, within the configured length ceiling.
    fn validate(&self, request: &Request) -> Result<(), EnsembleError> {
        if request.user_prompt.trim().is_empty() {
            return Err(EnsembleError::InvalidInput { detail: "prompt is empty".to_string() });
        }
        if request.user_prompt.len() > self.config.max_prompt_length {
            return Err(EnsembleError::InvalidInput { detail: format!("prompt exceeds {} characters", self.config.max_prompt_length) });
        }
        Ok(())
    }

    /// Step 2b: free-tier requests are capped at `rate_limit_per_hour_free`
    /// requests per user, in a sliding one-hour window.
    fn check_rate_limit(&self, request: &Request) -> Result<(), EnsembleError> {
        if request.tier != Tier::Free {
            return Ok(());
        }
        let now = Instant::now();
        let window = Duration::from_secs(60 * 60);
        let mut limits = self.rate_limits.lock().expect("rate limit mutex poisoned");
        let history = limits.entry(request.user_id.clone()).or_default();
        history.retain(|seen| now.duration_since(*seen) < window);
        if history.len() as u32 >= self.config.rate_limit_per_hour_free {
            return Err(EnsembleError::RateExceeded);
        }
        history.push(now);
        Ok(())
    }

    fn error_envelope(&self, request: &Request, kind: &str, started: Instant) -> Envelope {
        Envelope {
            synthesis: Synthesis {
                content: String::new(),
                status: SynthesisStatus::Error,
                model: None,
                confidence: None,
                fallback_reason: None,
            },
            roles: Vec::new(),
            voting: None,
            metadata: Metadata {
                correlation_id: request.correlation_id.clone(),
                total_processing_ms: started.elapsed().as_millis() as u64,
                successful_roles: 0,
                total_roles: 0,
                cached: false,
                tier: request.tier,
                error: Some(kind.to_string()),
            },
        }
    }

    /// Runs one request to completion: admission, cache probe, fan-out,
    /// voting, synthesis, scoring, and caching. Always returns an
    /// [`Envelope`]; terminal failures are reported through
    /// `metadata.error`, never as a propagated error.
    pub async fn run(&self, request: Request) -> Envelope {
        let started = Instant::now();

        let Ok(_admission_permit) = self.admission.clone().try_acquire_owned() else {
            self.log(LogLevel::Warn, "admission queue full", &request.correlation_id);
            return self.error_envelope(&request, error_kind_str(&EnsembleError::QueueFull), started);
        };

        if let Err(error) = self.validate(&request) {
            return self.error_envelope(&request, error_kind_str(&error), started);
        }
        if let Err(error) = self.check_rate_limit(&request) {
            return self.error_envelope(&request, error_kind_str(&error), started);
        }

        if let Some(hit) = self.cache.lookup(&request.user_prompt, &request.user_id, request.tier.as_str()).await {
            self.log(LogLevel::Info, "cache hit", &request.correlation_id);
            return Envelope {
                synthesis: Synthesis {
                    content: hit.response,
                    status: SynthesisStatus::Ok,
                    model: None,
                    confidence: None,
                    fallback_reason: None,
                },
                roles: Vec::new(),
                voting: None,
                metadata: Metadata {
                    correlation_id: request.correlation_id.clone(),
                    total_processing_ms: started.elapsed().as_millis() as u64,
                    successful_roles: 0,
                    total_roles: 0,
                    cached: true,
                    tier: request.tier,
                    error: None,
                },
            };
        }

        let _tier_permit = self.tier_gate(request.tier).clone().acquire_owned().await.expect("tier gate semaphore never closes");

        let deadline_at = started + request.deadline;
        let mut attempt = 0usize;
        loop {
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.error_envelope(&request, error_kind_str(&EnsembleError::Cancelled), started);
            }

            let outcome = self.run_attempt(&request, remaining, started).await;
            match outcome {
                AttemptOutcome::Settled(envelope) => return envelope,
                AttemptOutcome::RetryableFailure if attempt < self.config.retry_attempts => {
                    attempt += 1;
                    let backoff = self.config.retry_delay * 2u32.pow(attempt as u32 - 1);
                    tokio::time::sleep(backoff.min(remaining)).await;
                }
                AttemptOutcome::RetryableFailure => {
                    return self.error_envelope(&request, error_kind_str(&EnsembleError::RateExceeded), started);
                }
            }
        }
    }

    /// Steps 4-13 of one fan-out round. Returns `Settled` with the final
    /// envelope on any outcome that shouldn't be retried at the request
    /// level, or `RetryableFailure` when every model failed with a
    /// retryable error class and the caller may re-enqueue.
    async fn run_attempt(&self, request: &Request, remaining: Duration, started: Instant) -> AttemptOutcome {
        let context = self.memory.get_context(&request.user_id, &request.session_id, 500).await;
        let effective_prompt = if context.is_empty() { request.user_prompt.clone() } else { format!("{}\n\n{}", context, request.user_prompt) };

        let selections = self.registry.select(&effective_prompt, request.tier.as_str(), self.config.fan_out_k);
        let total_roles = selections.len();

        let mut tasks: Vec<(String, _)> = Vec::with_capacity(total_roles);
        for selection in &selections {
            let Some(client) = self.registry.client(&selection.model.id) else {
                continue;
            };
            let mut client = client;
            let call = ModelCall::new(selection.model.id.clone(), "ensemble role".to_string(), effective_prompt.clone());
            let future = async move { client.call(call).await };
            tasks.push((selection.model.id.clone(), Box::pin(future) as std::pin::Pin<Box<dyn std::future::Future<Output = Result<crate::types::ModelReply, EnsembleError>> + Send>>));
        }

        let fanout_config = FanoutConfig::builder().name("ensemble-round").build();
        let outcomes = fan_out(&fanout_config, tasks, remaining, &self.executor).await;

        let mut roles = Vec::with_capacity(total_roles);
        for selection in &selections {
            let matching = outcomes.iter().find(|o| o.model() == selection.model.id);
            let role = match matching {
                Some(FanoutOutcome::Completed { model, value }) => {
                    self.record_outcome(model, true, value.latency_ms, selection.model.base_reliability);
                    RoleResult::fulfilled(model.clone(), value, selection.model.base_reliability)
                }
                Some(FanoutOutcome::Failed { model, error }) => {
                    self.record_outcome(model, false, 0, 0.0);
                    RoleResult::rejected(model.clone(), selection.model.provider.clone(), selection.model.id.clone(), 0, error_kind_str(error))
                }
                Some(FanoutOutcome::Panicked { model }) => {
                    self.record_outcome(model, false, 0, 0.0);
                    RoleResult::rejected(model.clone(), selection.model.provider.clone(), selection.model.id.clone(), 0, "PROGRAMMER_BUG")
                }
                Some(FanoutOutcome::Cancelled { model }) => {
                    self.record_outcome(model, false, 0, 0.0);
                    RoleResult::rejected(model.clone(), selection.model.provider.clone(), selection.model.id.clone(), 0, "CANCELLED")
                }
                None => {
                    self.record_outcome(&selection.model.id, false, 0, 0.0);
                    RoleResult::rejected(selection.model.id.clone(), selection.model.provider.clone(), selection.model.id.clone(), 0, "PROGRAMMER_BUG")
                }
            };
            if let Some(state) = self.registry.runtime_state(&selection.model.id) {
                state.release_load();
            }
            roles.push(role);
        }

        let successful_roles = roles.iter().filter(|r| r.is_fulfilled()).count();

        if successful_roles == 0 {
            let any_retryable = roles.iter().any(|r| matches!(r.error_kind.as_deref(), Some("TIMEOUT") | Some("NETWORK") | Some("RATE_LIMITED") | Some("PROVIDER_5XX") | Some("PROVIDER_INVALID_PAYLOAD")));
            if !any_retryable || roles.is_empty() {
                let mut envelope = self.error_envelope(request, "AllModelsFailed", started);
                envelope.roles = roles;
                envelope.metadata.total_roles = total_roles;
                return AttemptOutcome::Settled(envelope);
            }
            return AttemptOutcome::RetryableFailure;
        }

        let historical = Arc::clone(&self.historical);
        let historical_supplier = move |model: &str| historical.factor(model);
        let outcomes: Vec<RoleOutcome> = roles
            .iter()
            .map(|r| match self.brier.reliability(&r.role) {
                Some(reliability) => r.to_role_outcome().with_semantic_confidence(reliability),
                None => r.to_role_outcome(),
            })
            .collect();
        let vote_result = self.voting.vote(&effective_prompt, &request.correlation_id, &outcomes, &historical_supplier, None);

        let fulfilled_roles: Vec<RoleResult> = roles.iter().filter(|r| r.is_fulfilled()).cloned().collect();
        let synthesis_outcome = self.synthesizer.synthesize(&effective_prompt, &fulfilled_roles).await;

        let (content, confidence, validation, fallback_reason) = match synthesis_outcome {
            Ok(SynthesisOutcome { content, confidence, validation }) => (content, Some(confidence), validation, None),
            Err(error) => {
                self.log(LogLevel::Warn, &format!("synthesis failed: {error}"), &request.correlation_id);
                let fallback = if fulfilled_roles.len() == 1 {
                    fulfilled_roles[0].content.clone().unwrap_or_default()
                } else {
                    fulfilled_roles
                        .iter()
                        .map(|r| format!("## {}\n{}", r.role, r.content.clone().unwrap_or_default()))
                        .collect::<Vec<_>>()
                        .join("\n\n")
                };
                (fallback, None, 0.5, Some(error.to_string()))
            }
        };

        let quality = compute_quality_score(content.len(), confidence.unwrap_or(0.5), validation, vote_result.consensus, successful_roles, total_roles);

        let _ = self.cache.store(&request.user_prompt, &request.user_id, request.tier.as_str(), &content, quality).await;
        let _ = self.memory.store(&request.user_id, &request.session_id, &content, false, quality, &vote_result.winner).await;

        let envelope = Envelope {
            synthesis: Synthesis {
                content,
                status: SynthesisStatus::Ok,
                model: if vote_result.winner.is_empty() { None } else { Some(vote_result.winner.clone()) },
                confidence,
                fallback_reason,
            },
            roles,
            voting: Some(vote_result),
            metadata: Metadata {
                correlation_id: request.correlation_id.clone(),
                total_processing_ms: started.elapsed().as_millis() as u64,
                successful_roles,
                total_roles,
                cached: false,
                tier: request.tier,
                error: None,
            },
        };
        AttemptOutcome::Settled(envelope)
    }

    fn record_outcome(&self, model: &str, success: bool, latency_ms: u64, quality: f64) {
        if let Some(state) = self.registry.runtime_state(model) {
            if success {
                state.record_success(latency_ms, quality);
            } else {
                state.record_failure();
            }
        }
    }

    /// Recalls free-text memories relevant to `query`, for callers that
    /// want to surface related past turns outside the main `run` pipeline.
    pub async fn recall(&self, query: &str) -> Vec<Memory> {
        self.memory.retrieve(query).await
    }
}

enum AttemptOutcome {
    Settled(Envelope),
    RetryableFailure,
}
