//! The five weighting dimensions and their hybrid combination.

use crate::types::{RoleOutcome, VoteWeights};
use crate::vectorize::mean_pairwise_cosine_distance;
use std::time::Duration;

const HYBRID_TRADITIONAL: f64 = 0.30;
const HYBRID_DIVERSITY: f64 = 0.20;
const HYBRID_HISTORICAL: f64 = 0.25;
const HYBRID_SEMANTIC: f64 = 0.15;
const HYBRID_RELIABILITY: f64 = 0.10;
const HYBRID_FLOOR: f64 = 0.01;

fn traditional_weight(outcome: &RoleOutcome) -> f64 {
    let mut weight = outcome.confidence;
    if outcome.latency < Duration::from_secs(3) {
        weight *= 1.1;
    } else if outcome.latency > Duration::from_secs(15) {
        weight *= 0.9;
    }
    let len = outcome.response.len();
    if (50..2000).contains(&len) {
        weight *= 1.05;
    } else if len < 20 {
        weight *= 0.8;
    }
    weight.max(0.0)
}

/// Traditional weights for every successful outcome, normalized to sum 1.
pub fn traditional_weights(successes: &[&RoleOutcome]) -> Vec<f64> {
    normalize(successes.iter().map(|o| traditional_weight(o)).collect())
}

/// Diversity weight shared by every role this round: `1 + mean pairwise
/// cosine distance` across all responses.
pub fn diversity_weight(successes: &[&RoleOutcome]) -> f64 {
    let responses: Vec<&str> = successes.iter().map(|o| o.response.as_str()).collect();
    1.0 + mean_pairwise_cosine_distance(&responses)
}

fn reliability_weight(outcome: &RoleOutcome) -> f64 {
    let mut weight: f64 = 0.5;
    if outcome.latency < Duration::from_secs(10) {
        weight += 0.2;
    }
    if outcome.response.len() > 100 {
        weight += 0.1;
    }
    if outcome.confidence > 0.7 {
        weight += 0.2;
    }
    weight.min(1.0)
}

/// Looks up a role's historical performance multiplier, defaulting to
/// `1.0` when the supplier has no data for it.
pub fn historical_weight(role: &str, supplier: &dyn Fn(&str) -> Option<f64>) -> f64 {
    supplier(role).unwrap_or(1.0)
}

/// Computes the full [`VoteWeights`] for every successful outcome and
/// normalizes the hybrid weight across them. `historical_supplier` is
/// injected so this crate never depends on however history is persisted.
pub fn compute(successes: &[&RoleOutcome], historical_supplier: &dyn Fn(&str) -> Option<f64>) -> Vec<(String, VoteWeights)> {
    if successes.is_empty() {
        return Vec::new();
    }

    let traditional = traditional_weights(successes);
    let diversity = diversity_weight(successes);

    let mut raw: Vec<VoteWeights> = successes
        .iter()
        .zip(traditional.iter())
        .map(|(outcome, &trad)| {
            let historical = historical_weight(&outcome.role, historical_supplier);
            let semantic = outcome.semantic_confidence();
            let reliability = reliability_weight(outcome);
            let hybrid = (HYBRID_TRADITIONAL * trad
                + HYBRID_DIVERSITY * (diversity - 1.0)
                + HYBRID_HISTORICAL * (historical - 1.0)
                + HYBRID_SEMANTIC * semantic
                + HYBRID_RELIABILITY * reliability)
                .max(HYBRID_FLOOR);

            VoteWeights {
                traditional: trad,
                diversity,
                historical,
                semantic,
                reliability,
                hybrid,
            }
        })
        .collect();

    let hybrid_sum: f64 = raw.iter().map(|w| w.hybrid).sum();
    for weight in &mut raw {
        weight.hybrid /= hybrid_sum;
    }

    successes.iter().map(|o| o.role.clone()).zip(raw).collect()
}

fn normalize(values: Vec<f64>) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 {
        let n = values.len().max(1) as f64;
        return values.iter().map(|_| 1.0 / n).collect();
    }
    values.into_iter().map(|v| v / sum).collect()
}
