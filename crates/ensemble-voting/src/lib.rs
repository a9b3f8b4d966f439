//! Hybrid-weighted voting across a fanned-out batch of model responses for
//! the ensemble orchestration runtime.
//!
//! [`VotingEngine::vote`] combines five weighting dimensions (traditional,
//! diversity, historical, semantic, reliability) into a single hybrid
//! weight per role, labels the result's consensus strength, and — when the
//! margin is too thin to trust — runs an eight-strategy tie-break cascade
//! before recommending abstention as a last resort.
//!
//! ```rust
//! use ensemble_voting::{RoleOutcome, VotingConfig, VotingEngine};
//! use std::time::Duration;
//!
//! let engine = VotingEngine::new(VotingConfig::builder().name("primary").build());
//! let outcomes = vec![
//!     RoleOutcome::new("gpt-x", "a thorough, well-structured answer to the question asked", 0.9, Duration::from_millis(800)),
//!     RoleOutcome::new("claude-y", "no", 0.2, Duration::from_secs(12)),
//! ];
//! let result = engine.vote("explain recursion", "corr-1", &outcomes, &|_role| None, None);
//! assert_eq!(result.winner, "gpt-x");
//! ```

mod abstain;
mod config;
mod engine;
mod events;
mod meta;
mod tiebreak;
mod types;
mod vectorize;
mod weights;

pub use abstain::{RequeryCounter, MAX_REQUERIES};
pub use config::{VotingConfig, VotingConfigBuilder};
pub use engine::VotingEngine;
pub use events::VotingEvent;
pub use meta::{MetaEvaluator, MetaVoteOutcome};
pub use tiebreak::{TieBreakOutcome, TieBreakStrategy};
pub use types::{Abstention, ConsensusLevel, RequeryStrategy, RoleOutcome, RoleStatus, VoteResult, VoteWeights};
