//! Pluggable long-window scoring the voting engine treats as external
//! input: historical per-model accuracy, and Brier-style calibration.
//!
//! Both are traits rather than concrete services because the runtime has
//! no opinion on how the long window is stored (in-memory, a metrics
//! backend, a separate analytics job) — only on the `model -> factor`
//! shape the voting engine's `historical_supplier` closure and the
//! semantic-confidence input it derives from calibration need.

use std::collections::HashMap;
use std::sync::RwLock;

/// Supplies `VotingEngine::vote`'s `historical_supplier`: a long-window
/// success/quality factor per model, `1.0` meaning "no adjustment".
pub trait HistoricalWeights: Send + Sync {
    fn factor(&self, model: &str) -> Option<f64>;
}

/// Supplies a calibration-derived reliability estimate per model, used to
/// seed a role's semantic confidence before voting.
pub trait BrierCalibration: Send + Sync {
    fn reliability(&self, model: &str) -> Option<f64>;
}

const EMA_ALPHA: f64 = 0.2;

/// In-memory [`HistoricalWeights`]: an exponential moving average of
/// observed quality per model, starting from `1.0` (no adjustment) the
/// first time a model is seen. Suitable as a default for tests and for
/// deployments with no separate analytics pipeline.
#[derive(Default)]
pub struct InMemoryHistoricalWeights {
    factors: RwLock<HashMap<String, f64>>,
}

impl InMemoryHistoricalWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observed quality score into `model`'s running factor.
    pub fn record(&self, model: &str, quality: f64) {
        let mut factors = self.factors.write().expect("historical weights lock poisoned");
        let current = *factors.get(model).unwrap_or(&1.0);
        factors.insert(model.to_string(), EMA_ALPHA * quality + (1.0 - EMA_ALPHA) * current);
    }
}

impl HistoricalWeights for InMemoryHistoricalWeights {
    fn factor(&self, model: &str) -> Option<f64> {
        self.factors.read().expect("historical weights lock poisoned").get(model).copied()
    }
}

/// In-memory [`BrierCalibration`]: an exponential moving average of
/// `1 - |confidence - outcome|` per model, where `outcome` is `1.0` for a
/// role later judged correct (won the vote) and `0.0` otherwise.
#[derive(Default)]
pub struct InMemoryBrierCalibration {
    reliability: RwLock<HashMap<String, f64>>,
}

impl InMemoryBrierCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one `(reported_confidence, was_correct)` observation into
    /// `model`'s running reliability estimate.
    pub fn record(&self, model: &str, reported_confidence: f64, was_correct: bool) {
        let brier_complement = 1.0 - (reported_confidence - if was_correct { 1.0 } else { 0.0 }).abs();
        let mut reliability = self.reliability.write().expect("brier calibration lock poisoned");
        let current = *reliability.get(model).unwrap_or(&0.5);
        reliability.insert(model.to_string(), EMA_ALPHA * brier_complement + (1.0 - EMA_ALPHA) * current);
    }
}

impl BrierCalibration for InMemoryBrierCalibration {
    fn reliability(&self, model: &str) -> Option<f64> {
        self.reliability.read().expect("brier calibration lock poisoned").get(model).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_model_has_no_historical_factor() {
        let weights = InMemoryHistoricalWeights::new();
        assert_eq!(weights.factor("gpt-x"), None);
    }

    #[test]
    fn recorded_quality_moves_factor_toward_observation() {
        let weights = InMemoryHistoricalWeights::new();
        weights.record("gpt-x", 1.0);
        let factor = weights.factor("gpt-x").unwrap();
        assert!(factor > 1.0 || (factor - 1.0).abs() < 1e-9);
        weights.record("gpt-x", 1.0);
        assert!(weights.factor("gpt-x").unwrap() > factor - 1e-9);
    }

    #[test]
    fn brier_reliability_rewards_confident_correct_predictions() {
        let brier = InMemoryBrierCalibration::new();
        brier.record("gpt-x", 0.95, true);
        assert!(brier.reliability("gpt-x").unwrap() > 0.5);
    }

    #[test]
    fn brier_reliability_penalizes_confident_wrong_predictions() {
        let brier = InMemoryBrierCalibration::new();
        brier.record("gpt-x", 0.95, false);
        assert!(brier.reliability("gpt-x").unwrap() < 0.5);
    }
}
