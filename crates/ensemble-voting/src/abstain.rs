//! Abstention: deciding when a vote is too unsettled to act on, and what
//! the caller should change before re-querying.

use crate::types::{Abstention, ConsensusLevel, RequeryStrategy};
use std::collections::HashMap;
use std::sync::Mutex;

/// Re-query attempts per `correlation_id` before abstention gives up and
/// lets the runner's own retry budget take over.
pub const MAX_REQUERIES: u32 = 3;

pub const ABSTAIN_THRESHOLD: f64 = 0.3;

/// Tracks how many times each correlation id has already abstained, so
/// repeated re-queries for the same logical request eventually stop being
/// recommended. The voting engine owns one of these for its lifetime.
#[derive(Debug, Default)]
pub struct RequeryCounter {
    counts: Mutex<HashMap<String, u32>>,
}

impl RequeryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, correlation_id: &str) -> u32 {
        let mut counts = self.counts.lock().expect("requery counter mutex poisoned");
        let entry = counts.entry(correlation_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }
}

fn recommend_strategy(candidate_count: usize, mean_response_len: f64) -> RequeryStrategy {
    if candidate_count < 3 {
        RequeryStrategy::ExpandModelSet
    } else if mean_response_len < 50.0 {
        RequeryStrategy::RaiseTokenBudget
    } else {
        RequeryStrategy::Rephrase
    }
}

/// Decides whether to abstain after the tie-break cascade has had its say.
/// Only `very-weak` consensus with a post-tie-break confidence still under
/// `abstain_threshold` is eligible; re-querying the same correlation id
/// past [`MAX_REQUERIES`] stops being recommended even then, since the
/// runner's own retry budget is the better backstop at that point.
#[allow(clippy::too_many_arguments)]
pub fn decide(consensus: ConsensusLevel, post_tiebreak_confidence: f64, abstain_threshold: f64, correlation_id: &str, counter: &RequeryCounter, candidate_count: usize, mean_response_len: f64) -> Abstention {
    if consensus != ConsensusLevel::VeryWeak || post_tiebreak_confidence > abstain_threshold {
        return Abstention::none();
    }

    let attempts = counter.record(correlation_id);
    if attempts > MAX_REQUERIES {
        return Abstention::none();
    }

    Abstention {
        should_abstain: true,
        recommended_strategy: Some(recommend_strategy(candidate_count, mean_response_len)),
    }
}
