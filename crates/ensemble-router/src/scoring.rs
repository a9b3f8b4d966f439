//! Composite scoring of a candidate model against a classified request.

use crate::classify::RequestKind;
use crate::model::{ModelDescriptor, ModelRuntimeState};

const WEIGHT_PERFORMANCE: f64 = 0.25;
const WEIGHT_COST: f64 = 0.20;
const WEIGHT_SPECIALTY: f64 = 0.25;
const WEIGHT_RELIABILITY: f64 = 0.20;
const WEIGHT_LOAD: f64 = 0.10;

/// Per-dimension scores plus the final composite, kept around for
/// explainability rather than collapsed into a single number.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBreakdown {
    pub performance: f64,
    pub cost: f64,
    pub specialty: f64,
    pub reliability: f64,
    pub load: f64,
    pub composite: f64,
}

/// Per-tier budget used to scale the cost score. Higher tiers tolerate
/// more expensive models without being penalized.
pub fn tier_budget(tier: &str) -> f64 {
    match tier {
        "enterprise" => 0.20,
        "pro" => 0.05,
        _ => 0.01, // free and anything unrecognized
    }
}

fn score_performance(state: &ModelRuntimeState) -> f64 {
    match state.success_rate() {
        None => 0.7,
        Some(success_rate) => {
            let latency_headroom = 1.0 - (state.last_latency_ms() as f64 / 10_000.0).min(1.0);
            (0.4 * success_rate + 0.3 * latency_headroom + 0.3 * state.ema_quality()).clamp(0.0, 1.0)
        }
    }
}

fn score_cost(model: &ModelDescriptor, tier: &str) -> f64 {
    let budget = tier_budget(tier);
    (1.0 - model.cost_per_request / budget).clamp(0.0, 1.0)
}

fn score_specialty(model: &ModelDescriptor, requested: RequestKind) -> f64 {
    if model.specialty == requested {
        1.0
    } else if model.specialty == RequestKind::General {
        0.7
    } else {
        0.5
    }
}

fn score_reliability(model: &ModelDescriptor) -> f64 {
    model.base_reliability.clamp(0.0, 1.0)
}

fn score_load(model: &ModelDescriptor, state: &ModelRuntimeState) -> f64 {
    if model.max_load == 0 {
        return 0.0;
    }
    (1.0 - state.current_load() as f64 / model.max_load as f64).clamp(0.0, 1.0)
}

/// Scores one candidate model for a classified request under a given tier.
pub fn score(model: &ModelDescriptor, state: &ModelRuntimeState, requested: RequestKind, tier: &str) -> ScoreBreakdown {
    let performance = score_performance(state);
    let cost = score_cost(model, tier);
    let specialty = score_specialty(model, requested);
    let reliability = score_reliability(model);
    let load = score_load(model, state);

    let composite = (WEIGHT_PERFORMANCE * performance
        + WEIGHT_COST * cost
        + WEIGHT_SPECIALTY * specialty
        + WEIGHT_RELIABILITY * reliability
        + WEIGHT_LOAD * load)
        .clamp(0.0, 1.0);

    ScoreBreakdown {
        performance,
        cost,
        specialty,
        reliability,
        load,
        composite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_defaults_performance_to_0_7() {
        let state = ModelRuntimeState::new();
        assert!((score_performance(&state) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn exact_specialty_match_scores_highest() {
        let model = ModelDescriptor::new("m1", "acme", RequestKind::Technical);
        assert_eq!(score_specialty(&model, RequestKind::Technical), 1.0);
        assert_eq!(score_specialty(&model, RequestKind::Creative), 0.5);
    }

    #[test]
    fn general_specialty_scores_0_7_against_anything() {
        let model = ModelDescriptor::new("m1", "acme", RequestKind::General);
        assert_eq!(score_specialty(&model, RequestKind::Technical), 0.7);
    }

    #[test]
    fn load_score_drops_as_current_load_rises() {
        let model = ModelDescriptor::new("m1", "acme", RequestKind::General).max_load(10);
        let state = ModelRuntimeState::new();
        let full = score_load(&model, &state);
        state.reserve_load();
        state.reserve_load();
        let after = score_load(&model, &state);
        assert!(after < full);
    }

    #[test]
    fn composite_score_is_clamped_to_unit_interval() {
        let model = ModelDescriptor::new("m1", "acme", RequestKind::Technical).cost_per_request(0.0).base_reliability(1.0);
        let state = ModelRuntimeState::new();
        let breakdown = score(&model, &state, RequestKind::Technical, "enterprise");
        assert!(breakdown.composite >= 0.0 && breakdown.composite <= 1.0);
    }
}
