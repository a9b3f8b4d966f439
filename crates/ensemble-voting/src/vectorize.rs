//! Minimal bag-of-words vectorization used only to measure how different
//! two responses are from each other, for the diversity weight. Deliberately
//! not shared with the cache crate's prompt-similarity vectors: the cache
//! needs a similarity *threshold* and persistence, this needs a one-shot
//! pairwise distance over whatever responses are in hand for a single vote.

use std::collections::BTreeMap;

fn tokenize(text: &str) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.len() <= 2 {
            continue;
        }
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }
    counts
}

fn cosine_similarity(a: &BTreeMap<String, u32>, b: &BTreeMap<String, u32>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().filter_map(|(term, &count)| b.get(term).map(|&other| count as f64 * other as f64)).sum();
    let norm_a = (a.values().map(|&c| (c as f64).powi(2)).sum::<f64>()).sqrt();
    let norm_b = (b.values().map(|&c| (c as f64).powi(2)).sum::<f64>()).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Mean pairwise cosine distance (`1 - cosine_similarity`) across all
/// distinct pairs of `responses`. Zero for fewer than two responses.
pub fn mean_pairwise_cosine_distance(responses: &[&str]) -> f64 {
    if responses.len() < 2 {
        return 0.0;
    }
    let vectors: Vec<_> = responses.iter().map(|r| tokenize(r)).collect();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += 1.0 - cosine_similarity(&vectors[i], &vectors[j]);
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}
