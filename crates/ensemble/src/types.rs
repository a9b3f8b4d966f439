//! Request/response shapes flowing through [`crate::EnsembleRunner`].

use ensemble_voting::RoleOutcome;
use std::time::Duration;

/// Which side of the free/premium split a request belongs to. Drives
/// per-tier concurrency limits, rate limiting, and router cost budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }
}

/// One caller-submitted prompt, immutable once admitted.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: String,
    pub user_prompt: String,
    pub user_id: String,
    pub session_id: String,
    pub tier: Tier,
    pub correlation_id: String,
    pub deadline: Duration,
    pub explain: bool,
}

/// The normalized call a composed model service accepts. Mirrors the
/// `ModelClient.Call` request shape: `{model, system, user, maxTokens}`.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

impl ModelCall {
    /// `maxTokens` defaults to 250 per role.
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            max_tokens: 250,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// The normalized reply a composed model service produces on success.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

/// Whether a role's call succeeded or failed, with the failure's EnsembleError kind
/// captured for the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStatus {
    Fulfilled,
    Rejected,
}

/// One selected model's outcome for a single request, independent of
/// whether it succeeded.
#[derive(Debug, Clone)]
pub struct RoleResult {
    pub role: String,
    pub provider: String,
    pub model: String,
    pub status: RoleStatus,
    pub content: Option<String>,
    pub word_count: Option<usize>,
    pub latency_ms: u64,
    pub confidence: f64,
    pub error_kind: Option<String>,
}

impl RoleResult {
    pub fn fulfilled(role: impl Into<String>, reply: &ModelReply, confidence: f64) -> Self {
        let word_count = reply.text.split_whitespace().count();
        Self {
            role: role.into(),
            provider: reply.provider.clone(),
            model: reply.model.clone(),
            status: RoleStatus::Fulfilled,
            content: Some(reply.text.clone()),
            word_count: Some(word_count),
            latency_ms: reply.latency_ms,
            confidence,
            error_kind: None,
        }
    }

    pub fn rejected(role: impl Into<String>, provider: impl Into<String>, model: impl Into<String>, latency_ms: u64, error_kind: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            provider: provider.into(),
            model: model.into(),
            status: RoleStatus::Rejected,
            content: None,
            word_count: None,
            latency_ms,
            confidence: 0.0,
            error_kind: Some(error_kind.into()),
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status == RoleStatus::Fulfilled
    }

    /// Converts this role into the input shape the voting engine consumes.
    pub fn to_role_outcome(&self) -> RoleOutcome {
        match &self.status {
            RoleStatus::Fulfilled => RoleOutcome::new(
                self.role.clone(),
                self.content.clone().unwrap_or_default(),
                self.confidence,
                Duration::from_millis(self.latency_ms),
            ),
            RoleStatus::Rejected => RoleOutcome::failed(self.role.clone(), self.error_kind.clone().unwrap_or_default()),
        }
    }
}

/// A memory retrieved via [`crate::traits::MemoryStore::retrieve`].
#[derive(Debug, Clone)]
pub struct Memory {
    pub content: String,
    pub score: f64,
}

/// What a [`crate::traits::Synthesizer`] produces on success.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub content: String,
    pub confidence: f64,
    pub validation: f64,
}

/// Final status of the synthesized answer in the returned envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisStatus {
    Ok,
    Error,
}

/// The `synthesis` section of the returned envelope.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub content: String,
    pub status: SynthesisStatus,
    pub model: Option<String>,
    pub confidence: Option<f64>,
    pub fallback_reason: Option<String>,
}

/// The `metadata` section of the returned envelope.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub correlation_id: String,
    pub total_processing_ms: u64,
    pub successful_roles: usize,
    pub total_roles: usize,
    pub cached: bool,
    pub tier: Tier,
    pub error: Option<String>,
}

/// The stable envelope every `Run` returns, success or failure.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub synthesis: Synthesis,
    pub roles: Vec<RoleResult>,
    pub voting: Option<ensemble_voting::VoteResult>,
    pub metadata: Metadata,
}

/// Severity passed to [`crate::traits::Observer::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
