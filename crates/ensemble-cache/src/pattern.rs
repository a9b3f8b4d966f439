//! Per-user query history used by the predictive lookup layer.

use crate::classify::PromptKind;
use crate::vector::PromptVector;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// How long a user's patterns are retained without a fresh query before
/// they expire.
pub const USER_PATTERN_IDLE_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

/// A single recorded query, kept so a later same-kind query from the same
/// user can be matched against it by Jaccard similarity.
#[derive(Debug, Clone)]
pub struct UserPattern {
    pub kind: PromptKind,
    pub vector: PromptVector,
    pub cache_key: String,
    last_seen: Instant,
}

/// FIFO history of a single user's recent queries, bounded per user and
/// expired as a whole once idle past [`USER_PATTERN_IDLE_LIMIT`].
pub struct UserPatternStore {
    per_user: HashMap<String, VecDeque<UserPattern>>,
    max_per_user: usize,
}

impl UserPatternStore {
    pub fn new(max_per_user: usize) -> Self {
        Self {
            per_user: HashMap::new(),
            max_per_user: max_per_user.max(1),
        }
    }

    pub fn record(&mut self, user_id: &str, kind: PromptKind, vector: PromptVector, cache_key: String) {
        let history = self.per_user.entry(user_id.to_string()).or_default();
        if history.len() >= self.max_per_user {
            history.pop_front();
        }
        history.push_back(UserPattern {
            kind,
            vector,
            cache_key,
            last_seen: Instant::now(),
        });
    }

    /// Best same-kind match for `vector` in the user's history, above
    /// `jaccard_threshold`.
    pub fn best_match(&self, user_id: &str, kind: PromptKind, vector: &PromptVector, jaccard_threshold: f64) -> Option<String> {
        let history = self.per_user.get(user_id)?;
        history
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| (p.vector.jaccard_similarity(vector), p))
            .filter(|(sim, _)| *sim > jaccard_threshold)
            .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, p)| p.cache_key.clone())
    }

    /// Drops users whose entire history has gone idle past the retention
    /// window. Returns the number of users dropped.
    pub fn expire_idle(&mut self) -> usize {
        let before = self.per_user.len();
        self.per_user.retain(|_, history| {
            history
                .back()
                .map(|p| p.last_seen.elapsed() < USER_PATTERN_IDLE_LIMIT)
                .unwrap_or(false)
        });
        before - self.per_user.len()
    }

    #[cfg(test)]
    pub(crate) fn user_count(&self) -> usize {
        self.per_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_same_kind_above_threshold() {
        let mut store = UserPatternStore::new(10);
        store.record(
            "u1",
            PromptKind::Explanation,
            PromptVector::from_prompt("explain retry backoff strategies"),
            "key-1".to_string(),
        );

        let got = store.best_match(
            "u1",
            PromptKind::Explanation,
            &PromptVector::from_prompt("explain retry backoff jitter"),
            0.3,
        );
        assert_eq!(got, Some("key-1".to_string()));
    }

    #[test]
    fn ignores_different_kind() {
        let mut store = UserPatternStore::new(10);
        store.record(
            "u1",
            PromptKind::Definition,
            PromptVector::from_prompt("what is a circuit breaker"),
            "key-1".to_string(),
        );

        let got = store.best_match(
            "u1",
            PromptKind::Explanation,
            &PromptVector::from_prompt("what is a circuit breaker"),
            0.1,
        );
        assert_eq!(got, None);
    }

    #[test]
    fn evicts_oldest_when_per_user_limit_reached() {
        let mut store = UserPatternStore::new(1);
        store.record(
            "u1",
            PromptKind::General,
            PromptVector::from_prompt("chocolate cake recipe"),
            "key-1".to_string(),
        );
        store.record(
            "u1",
            PromptKind::General,
            PromptVector::from_prompt("vanilla cake recipe"),
            "key-2".to_string(),
        );

        let got = store.best_match("u1", PromptKind::General, &PromptVector::from_prompt("chocolate cake recipe"), 0.0);
        assert_eq!(got, Some("key-2".to_string()));
    }

    #[test]
    fn user_count_reflects_recorded_users() {
        let mut store = UserPatternStore::new(10);
        store.record("u1", PromptKind::General, PromptVector::from_prompt("hello world"), "key-1".to_string());
        assert_eq!(store.user_count(), 1);
    }
}
