//! Events emitted by a [`crate::VotingEngine`].

use ensemble_core::EnsembleEvent;
use std::time::Instant;

/// An event emitted over the lifetime of a [`crate::VotingEngine`].
#[derive(Debug, Clone)]
pub enum VotingEvent {
    /// A vote settled without needing the tie-break cascade.
    Decided { name: String, timestamp: Instant, winner: String, confidence: f64 },
    /// The tie-break cascade ran and a strategy past `historical_performance`
    /// decided the winner.
    TieBroken { name: String, timestamp: Instant, strategy: &'static str, winner: String },
    /// The meta-voting evaluator was invoked and its response was rejected
    /// as a schema violation.
    MetaVoteFellBack { name: String, timestamp: Instant },
    /// The engine recommended abstaining rather than returning a winner.
    Abstained { name: String, timestamp: Instant },
}

impl EnsembleEvent for VotingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VotingEvent::Decided { .. } => "decided",
            VotingEvent::TieBroken { .. } => "tie_broken",
            VotingEvent::MetaVoteFellBack { .. } => "meta_vote_fell_back",
            VotingEvent::Abstained { .. } => "abstained",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            VotingEvent::Decided { timestamp, .. }
            | VotingEvent::TieBroken { timestamp, .. }
            | VotingEvent::MetaVoteFellBack { timestamp, .. }
            | VotingEvent::Abstained { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            VotingEvent::Decided { name, .. } | VotingEvent::TieBroken { name, .. } | VotingEvent::MetaVoteFellBack { name, .. } | VotingEvent::Abstained { name, .. } => name,
        }
    }
}
