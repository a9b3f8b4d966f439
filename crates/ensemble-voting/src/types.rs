//! Shared types flowing through the voting pipeline.

use std::time::Duration;

/// Outcome of a single model's attempt at a request, as seen by the voting
/// engine. The engine doesn't care which provider produced it, only the
/// fields it needs to weigh and compare candidates.
#[derive(Debug, Clone)]
pub struct RoleOutcome {
    /// Identifies the role/model that produced this outcome, e.g. a model
    /// id or a named role like `"primary"`.
    pub role: String,
    pub status: RoleStatus,
    pub response: String,
    /// The model's own self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    pub latency: Duration,
    /// Caller-supplied semantic confidence (e.g. from an embedding
    /// comparison against the prompt). Defaults to `0.5` when absent.
    pub semantic_confidence: Option<f64>,
}

impl RoleOutcome {
    pub fn new(role: impl Into<String>, response: impl Into<String>, confidence: f64, latency: Duration) -> Self {
        Self {
            role: role.into(),
            status: RoleStatus::Success,
            response: response.into(),
            confidence,
            latency,
            semantic_confidence: None,
        }
    }

    pub fn with_semantic_confidence(mut self, semantic_confidence: f64) -> Self {
        self.semantic_confidence = Some(semantic_confidence);
        self
    }

    pub fn failed(role: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            status: RoleStatus::Error { detail: detail.into() },
            response: String::new(),
            confidence: 0.0,
            latency: Duration::ZERO,
            semantic_confidence: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, RoleStatus::Success)
    }

    pub fn semantic_confidence(&self) -> f64 {
        self.semantic_confidence.unwrap_or(0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStatus {
    Success,
    Error { detail: String },
}

/// The five weighting dimensions for one role, plus the combined hybrid
/// weight, kept around for explainability.
#[derive(Debug, Clone, Copy)]
pub struct VoteWeights {
    pub traditional: f64,
    pub diversity: f64,
    pub historical: f64,
    pub semantic: f64,
    pub reliability: f64,
    pub hybrid: f64,
}

/// How clearly the hybrid weights favored one role over the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusLevel {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    VeryWeak,
}

impl ConsensusLevel {
    /// Classifies consensus from the top hybrid weight and the margin over
    /// the runner-up.
    pub fn classify(top: f64, margin: f64) -> Self {
        if top > 0.7 && margin > 0.3 {
            ConsensusLevel::VeryStrong
        } else if top > 0.6 && margin > 0.2 {
            ConsensusLevel::Strong
        } else if top > 0.45 {
            ConsensusLevel::Moderate
        } else if top > 0.35 {
            ConsensusLevel::Weak
        } else {
            ConsensusLevel::VeryWeak
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, ConsensusLevel::Weak | ConsensusLevel::VeryWeak)
    }
}

/// A recommendation for what the caller should change before re-querying
/// after an abstention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeryStrategy {
    Rephrase,
    ExpandModelSet,
    RaiseTokenBudget,
}

/// Everything the voting engine decided, with every intermediate preserved
/// for explainability.
#[derive(Debug, Clone)]
pub struct VoteResult {
    pub winner: String,
    pub confidence: f64,
    pub consensus: ConsensusLevel,
    pub weights: Vec<(String, VoteWeights)>,
    pub tie_break: Option<crate::tiebreak::TieBreakOutcome>,
    pub meta_vote: Option<crate::meta::MetaVoteOutcome>,
    pub abstention: Abstention,
}

#[derive(Debug, Clone)]
pub struct Abstention {
    pub should_abstain: bool,
    pub recommended_strategy: Option<RequeryStrategy>,
}

impl Abstention {
    pub fn none() -> Self {
        Self {
            should_abstain: false,
            recommended_strategy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consensus_classification_matches_boundaries() {
        assert_eq!(ConsensusLevel::classify(0.75, 0.35), ConsensusLevel::VeryStrong);
        assert_eq!(ConsensusLevel::classify(0.65, 0.25), ConsensusLevel::Strong);
        assert_eq!(ConsensusLevel::classify(0.5, 0.05), ConsensusLevel::Moderate);
        assert_eq!(ConsensusLevel::classify(0.36, 0.01), ConsensusLevel::Weak);
        assert_eq!(ConsensusLevel::classify(0.3, 0.0), ConsensusLevel::VeryWeak);
    }

    #[test]
    fn default_semantic_confidence_is_one_half() {
        let outcome = RoleOutcome::new("m1", "hello", 0.9, Duration::from_millis(100));
        assert_eq!(outcome.semantic_confidence(), 0.5);
    }
}
