//! Selects `k` distinct models for a request.

use crate::classify::{classify, RequestKind};
use crate::model::{ModelDescriptor, ModelRuntimeState};
use crate::scoring::{score, ScoreBreakdown};
use std::collections::HashSet;
use std::sync::Arc;

/// A selected model plus the score breakdown that picked it, for
/// explainability.
#[derive(Debug, Clone)]
pub struct Selection {
    pub model: ModelDescriptor,
    pub score: ScoreBreakdown,
}

struct Candidate {
    model: ModelDescriptor,
    state: Arc<ModelRuntimeState>,
}

/// Selects models for incoming requests from a registered candidate pool,
/// scoring and diversifying across providers, with a fixed fallback triple
/// for when selection itself fails.
pub struct ModelRouter {
    candidates: Vec<Candidate>,
    fallback: [ModelDescriptor; 3],
}

impl ModelRouter {
    pub fn new(fallback: [ModelDescriptor; 3]) -> Self {
        Self {
            candidates: Vec::new(),
            fallback,
        }
    }

    pub fn register(&mut self, model: ModelDescriptor, state: Arc<ModelRuntimeState>) {
        self.candidates.push(Candidate { model, state });
    }

    pub fn runtime_state(&self, model_id: &str) -> Option<Arc<ModelRuntimeState>> {
        self.candidates
            .iter()
            .find(|c| c.model.id == model_id)
            .map(|c| Arc::clone(&c.state))
    }

    /// Selects up to `k` distinct models for `prompt` under `tier`.
    ///
    /// `is_available` excludes models whose circuit breaker is open; it is
    /// injected rather than imported from the breaker crate so this crate
    /// has no dependency on breaker internals.
    pub fn select(&self, prompt: &str, tier: &str, k: usize, is_available: impl Fn(&str) -> bool) -> Vec<Selection> {
        let requested = classify(prompt);

        let mut scored: Vec<Selection> = self
            .candidates
            .iter()
            .filter(|c| is_available(&c.model.id))
            .map(|c| Selection {
                model: c.model.clone(),
                score: score(&c.model, &c.state, requested, tier),
            })
            .collect();

        if scored.is_empty() {
            return self.reserve_and_return(self.fallback_selections(requested, tier));
        }

        scored.sort_by(|a, b| b.score.composite.partial_cmp(&a.score.composite).unwrap_or(std::cmp::Ordering::Equal));

        let mut chosen = Vec::with_capacity(k);
        let mut seen_providers = HashSet::new();

        // Diversify: best score per distinct provider first.
        for selection in &scored {
            if chosen.len() >= k {
                break;
            }
            if seen_providers.insert(selection.model.provider.clone()) {
                chosen.push(selection.clone());
            }
        }

        // Fill remaining slots by score regardless of provider.
        for selection in &scored {
            if chosen.len() >= k {
                break;
            }
            if !chosen.iter().any(|s: &Selection| s.model.id == selection.model.id) {
                chosen.push(selection.clone());
            }
        }

        self.reserve_and_return(chosen)
    }

    fn fallback_selections(&self, requested: RequestKind, tier: &str) -> Vec<Selection> {
        self.fallback
            .iter()
            .map(|model| {
                let state = self.runtime_state(&model.id).unwrap_or_default();
                Selection {
                    model: model.clone(),
                    score: score(model, &state, requested, tier),
                }
            })
            .collect()
    }

    fn reserve_and_return(&self, selections: Vec<Selection>) -> Vec<Selection> {
        for selection in &selections {
            if let Some(state) = self.runtime_state(&selection.model.id) {
                state.reserve_load();
            }
        }
        selections
    }
}
