//! Sparse prompt vectors used by the similarity and predictive lookup layers.

use std::collections::BTreeMap;

/// A sparse word-count vector over a prompt's lowercased tokens.
///
/// Tokens of length two or less are dropped: they carry little discriminating
/// signal and would otherwise dominate the dot product for short prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptVector {
    counts: BTreeMap<String, u32>,
}

impl PromptVector {
    pub fn from_prompt(prompt: &str) -> Self {
        let mut counts = BTreeMap::new();
        for token in tokenize(prompt) {
            *counts.entry(token).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Cosine similarity against another vector, in `[0, 1]` for non-negative
    /// count vectors. Returns `0.0` if either vector is empty.
    pub fn cosine_similarity(&self, other: &PromptVector) -> f64 {
        if self.counts.is_empty() || other.counts.is_empty() {
            return 0.0;
        }

        let mut dot = 0.0;
        for (token, &count) in &self.counts {
            if let Some(&other_count) = other.counts.get(token) {
                dot += (count as f64) * (other_count as f64);
            }
        }

        let norm_self = magnitude(&self.counts);
        let norm_other = magnitude(&other.counts);
        if norm_self == 0.0 || norm_other == 0.0 {
            return 0.0;
        }

        (dot / (norm_self * norm_other)).clamp(0.0, 1.0)
    }

    /// Jaccard similarity of the two vectors' token sets, ignoring counts.
    pub fn jaccard_similarity(&self, other: &PromptVector) -> f64 {
        if self.counts.is_empty() && other.counts.is_empty() {
            return 0.0;
        }

        let intersection = self.counts.keys().filter(|t| other.counts.contains_key(*t)).count();
        let union = self.counts.len() + other.counts.len() - intersection;
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }
}

fn magnitude(counts: &BTreeMap<String, u32>) -> f64 {
    counts.values().map(|&c| (c as f64).powi(2)).sum::<f64>().sqrt()
}

/// Lowercases and splits on non-alphanumeric boundaries, keeping tokens
/// longer than two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_prompts_have_similarity_one() {
        let a = PromptVector::from_prompt("Explain how circuit breakers work");
        let b = PromptVector::from_prompt("explain how circuit breakers work");
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_prompts_have_low_similarity() {
        let a = PromptVector::from_prompt("explain circuit breakers in distributed systems");
        let b = PromptVector::from_prompt("recommend a recipe for chocolate cake");
        assert!(a.cosine_similarity(&b) < 0.2);
    }

    #[test]
    fn empty_vector_has_zero_similarity() {
        let a = PromptVector::from_prompt("hi ok");
        let b = PromptVector::from_prompt("explain retries");
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn tokenize_drops_short_tokens_and_lowercases() {
        let tokens = tokenize("Is AI a big deal in 2026?");
        assert!(tokens.contains(&"big".to_string()));
        assert!(tokens.contains(&"deal".to_string()));
        assert!(!tokens.contains(&"is".to_string()));
        assert!(!tokens.contains(&"a".to_string()));
    }

    #[test]
    fn jaccard_similarity_of_overlapping_sets() {
        let a = PromptVector::from_prompt("explain retry backoff strategies");
        let b = PromptVector::from_prompt("explain retry backoff jitter");
        let sim = a.jaccard_similarity(&b);
        assert!(sim > 0.4 && sim < 1.0);
    }
}
