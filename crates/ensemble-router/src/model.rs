//! Model descriptors and their live runtime state.

use crate::classify::RequestKind;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Static facts about a model a request can be routed to.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: String,
    pub specialty: RequestKind,
    pub cost_per_request: f64,
    pub base_reliability: f64,
    pub max_load: usize,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, provider: impl Into<String>, specialty: RequestKind) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            specialty,
            cost_per_request: 0.01,
            base_reliability: 0.8,
            max_load: 50,
        }
    }

    pub fn cost_per_request(mut self, cost: f64) -> Self {
        self.cost_per_request = cost;
        self
    }

    pub fn base_reliability(mut self, reliability: f64) -> Self {
        self.base_reliability = reliability;
        self
    }

    pub fn max_load(mut self, max_load: usize) -> Self {
        self.max_load = max_load;
        self
    }
}

/// Live, frequently-updated counters for a single model, shared across
/// concurrent in-flight requests.
///
/// `current_load` is incremented exactly once per selection and must be
/// released exactly once by the caller on every exit path (success,
/// failure, cancellation, or panic) — the router only ever increments it.
#[derive(Debug, Default)]
pub struct ModelRuntimeState {
    current_load: AtomicUsize,
    successes: AtomicU64,
    failures: AtomicU64,
    /// Exponential moving average of response quality, scaled by 1_000_000
    /// for lock-free fixed-point storage.
    ema_quality_scaled: AtomicU64,
    last_latency_ms: AtomicU64,
}

const EMA_SCALE: f64 = 1_000_000.0;
const EMA_ALPHA: f64 = 0.2;

impl ModelRuntimeState {
    pub fn new() -> Self {
        Self {
            current_load: AtomicUsize::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            ema_quality_scaled: AtomicU64::new((0.7 * EMA_SCALE) as u64),
            last_latency_ms: AtomicU64::new(0),
        }
    }

    pub fn current_load(&self) -> usize {
        self.current_load.load(Ordering::Relaxed)
    }

    /// Reserves one load slot for a newly selected model.
    pub fn reserve_load(&self) {
        self.current_load.fetch_add(1, Ordering::Relaxed);
    }

    /// Releases one previously reserved load slot. Safe to call on any
    /// exit path; saturates at zero rather than underflowing.
    pub fn release_load(&self) {
        let _ = self
            .current_load
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn record_success(&self, latency_ms: u64, quality: f64) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.last_latency_ms.store(latency_ms, Ordering::Relaxed);
        self.update_ema(quality);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn update_ema(&self, quality: f64) {
        let current = self.ema_quality_scaled.load(Ordering::Relaxed) as f64 / EMA_SCALE;
        let updated = EMA_ALPHA * quality + (1.0 - EMA_ALPHA) * current;
        self.ema_quality_scaled.store((updated * EMA_SCALE) as u64, Ordering::Relaxed);
    }

    pub fn success_rate(&self) -> Option<f64> {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let total = successes + failures;
        if total == 0 {
            None
        } else {
            Some(successes as f64 / total as f64)
        }
    }

    pub fn ema_quality(&self) -> f64 {
        self.ema_quality_scaled.load(Ordering::Relaxed) as f64 / EMA_SCALE
    }

    pub fn last_latency_ms(&self) -> u64 {
        self.last_latency_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_and_release_track_current_load() {
        let state = ModelRuntimeState::new();
        state.reserve_load();
        state.reserve_load();
        assert_eq!(state.current_load(), 2);
        state.release_load();
        assert_eq!(state.current_load(), 1);
    }

    #[test]
    fn release_never_underflows() {
        let state = ModelRuntimeState::new();
        state.release_load();
        assert_eq!(state.current_load(), 0);
    }

    #[test]
    fn success_rate_is_none_without_data() {
        let state = ModelRuntimeState::new();
        assert_eq!(state.success_rate(), None);
    }

    #[test]
    fn success_rate_reflects_recorded_outcomes() {
        let state = ModelRuntimeState::new();
        state.record_success(100, 0.9);
        state.record_failure();
        assert_eq!(state.success_rate(), Some(0.5));
    }

    #[test]
    fn ema_quality_moves_toward_observed_quality() {
        let state = ModelRuntimeState::new();
        let before = state.ema_quality();
        state.record_success(50, 1.0);
        assert!(state.ema_quality() > before);
    }
}
