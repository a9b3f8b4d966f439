//! [`VotingEngine`]: the entry point that runs every role outcome through
//! weighting, consensus labelling, the tie-break cascade and abstention.

use crate::abstain::{self, RequeryCounter};
use crate::config::VotingConfig;
use crate::events::VotingEvent;
use crate::meta::MetaEvaluator;
use crate::tiebreak::{self, TieBreakOutcome};
use crate::types::{Abstention, ConsensusLevel, RoleOutcome, VoteResult};
use crate::weights;
use std::time::Instant;

/// Runs the full voting pipeline over a batch of role outcomes for one
/// request.
pub struct VotingEngine {
    config: VotingConfig,
    requery_counter: RequeryCounter,
}

impl VotingEngine {
    pub fn new(config: VotingConfig) -> Self {
        Self {
            config,
            requery_counter: RequeryCounter::new(),
        }
    }

    /// Votes over `outcomes` for `prompt`, tracking re-query attempts under
    /// `correlation_id`. `historical_supplier` looks up a role's past
    /// performance multiplier; `meta_evaluator`, if supplied, backs the
    /// `meta_voting` tie-break strategy.
    pub fn vote(&self, prompt: &str, correlation_id: &str, outcomes: &[RoleOutcome], historical_supplier: &dyn Fn(&str) -> Option<f64>, meta_evaluator: Option<MetaEvaluator<'_>>) -> VoteResult {
        let successes: Vec<&RoleOutcome> = outcomes.iter().filter(|o| o.is_success()).collect();

        if successes.is_empty() {
            return VoteResult {
                winner: String::new(),
                confidence: 0.0,
                consensus: ConsensusLevel::VeryWeak,
                weights: Vec::new(),
                tie_break: None,
                meta_vote: None,
                abstention: Abstention {
                    should_abstain: true,
                    recommended_strategy: Some(crate::types::RequeryStrategy::ExpandModelSet),
                },
            };
        }

        let weights = weights::compute(&successes, historical_supplier);
        let mut sorted_hybrid: Vec<f64> = weights.iter().map(|(_, w)| w.hybrid).collect();
        sorted_hybrid.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let (traditional_winner, traditional_winner_weights) = weights.iter().max_by(|a, b| a.1.hybrid.partial_cmp(&b.1.hybrid).unwrap_or(std::cmp::Ordering::Equal)).expect("weights is non-empty");
        let traditional_winner = traditional_winner.clone();
        let traditional_winner_confidence = traditional_winner_weights.hybrid;

        let top = sorted_hybrid[0];
        let margin = top - sorted_hybrid.get(1).copied().unwrap_or(0.0);
        let consensus = ConsensusLevel::classify(top, margin);

        let mut tie_break: Option<TieBreakOutcome> = None;
        let (mut winner, mut confidence) = (traditional_winner.clone(), traditional_winner_confidence);

        if tiebreak::should_trigger(&sorted_hybrid, consensus.is_weak()) {
            let outcome = tiebreak::run(prompt, &successes, &weights, &traditional_winner, traditional_winner_confidence, historical_supplier, meta_evaluator);
            if outcome.meta_vote.as_ref().is_some_and(|m| m.fell_back) {
                self.emit(VotingEvent::MetaVoteFellBack {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                });
            }
            self.emit(VotingEvent::TieBroken {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                strategy: outcome.strategy.as_str(),
                winner: outcome.winner.clone(),
            });
            winner = outcome.winner.clone();
            confidence = outcome.confidence;
            tie_break = Some(outcome);
        } else {
            self.emit(VotingEvent::Decided {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                winner: winner.clone(),
                confidence,
            });
        }

        let mean_response_len = successes.iter().map(|o| o.response.len()).sum::<usize>() as f64 / successes.len() as f64;
        let abstention = abstain::decide(consensus, confidence, self.config.abstain_threshold, correlation_id, &self.requery_counter, successes.len(), mean_response_len);
        if abstention.should_abstain {
            self.emit(VotingEvent::Abstained {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
            });
        }

        let meta_vote = tie_break.as_ref().and_then(|t| t.meta_vote.clone());

        VoteResult {
            winner,
            confidence,
            consensus,
            weights,
            tie_break,
            meta_vote,
            abstention,
        }
    }

    fn emit(&self, event: VotingEvent) {
        self.config.event_listeners.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn no_history() -> &'static dyn Fn(&str) -> Option<f64> {
        &|_| None
    }

    #[test]
    fn clear_winner_settles_without_tie_break() {
        let engine = VotingEngine::new(VotingConfig::builder().name("v1").build());
        let outcomes = vec![
            RoleOutcome::new("a", "a long and thorough answer covering every detail the user asked about", 0.95, Duration::from_millis(500)),
            RoleOutcome::new("b", "no", 0.1, Duration::from_secs(20)),
        ];
        let result = engine.vote("explain recursion", "corr-1", &outcomes, no_history(), None);
        assert_eq!(result.winner, "a");
        assert!(result.tie_break.is_none());
    }

    #[test]
    fn near_tie_triggers_cascade_and_still_returns_a_winner() {
        let engine = VotingEngine::new(VotingConfig::builder().name("v1").build());
        let outcomes = vec![
            RoleOutcome::new("a", "a reasonably detailed explanation of the topic at hand here", 0.6, Duration::from_secs(2)),
            RoleOutcome::new("b", "a similarly detailed explanation of the same topic at hand", 0.6, Duration::from_secs(2)),
        ];
        let result = engine.vote("explain recursion", "corr-2", &outcomes, no_history(), None);
        assert!(!result.winner.is_empty());
        assert!(result.tie_break.is_some());
    }

    #[test]
    fn all_failed_outcomes_abstains() {
        let engine = VotingEngine::new(VotingConfig::builder().name("v1").build());
        let outcomes = vec![RoleOutcome::failed("a", "timeout"), RoleOutcome::failed("b", "timeout")];
        let result = engine.vote("explain recursion", "corr-3", &outcomes, no_history(), None);
        assert!(result.abstention.should_abstain);
    }

    #[test]
    fn weights_are_exposed_for_every_successful_role() {
        let engine = VotingEngine::new(VotingConfig::builder().name("v1").build());
        let outcomes = vec![
            RoleOutcome::new("a", "a response of typical length used in this test case here", 0.8, Duration::from_secs(1)),
            RoleOutcome::new("b", "another response of typical length used in this test too", 0.7, Duration::from_secs(1)),
        ];
        let result = engine.vote("prompt", "corr-4", &outcomes, no_history(), None);
        assert_eq!(result.weights.len(), 2);
    }
}
