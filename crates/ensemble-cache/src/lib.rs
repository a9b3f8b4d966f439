//! Three-layer semantic response cache for the ensemble orchestration
//! runtime.
//!
//! A [`SemanticCache`] is probed in order, first hit wins:
//!
//! 1. **Exact**: sha256 of `(prompt, user_id, tier)`, an in-memory map.
//! 2. **Similarity**: cosine similarity between the incoming prompt's sparse
//!    word-count vector and every stored vector for the same `(user_id,
//!    tier)`.
//! 3. **Predictive**: the prompt is classified into a coarse intent bucket;
//!    among the user's recent same-bucket queries, the highest
//!    Jaccard-similarity match above threshold wins.
//!
//! Writes are skipped below a quality threshold, TTL-banded by quality, and
//! gzip-compressed above a configurable payload size. Eviction drops the
//! oldest 20% of entries once over capacity rather than evicting a single
//! item per insert, since a request-scoped cache reclaims in bulk.
//!
//! ```rust
//! use ensemble_cache::{CacheConfig, SemanticCache};
//!
//! # async fn example() {
//! let cache = SemanticCache::new(CacheConfig::builder().name("ensemble").build());
//!
//! assert!(cache.lookup("explain retries", "u1", "free").await.is_none());
//! cache.store("explain retries", "u1", "free", "retries resend failed calls", 0.9).await.unwrap();
//! let hit = cache.lookup("explain retries", "u1", "free").await.unwrap();
//! assert_eq!(hit.response, "retries resend failed calls");
//! # }
//! ```

mod classify;
mod config;
mod error;
mod events;
mod key;
mod pattern;
mod store;
mod vector;

pub use classify::PromptKind;
pub use config::{CacheConfig, CacheConfigBuilder, QualityBand};
pub use error::CacheError;
pub use events::{CacheEvent, HitLayer};
pub use vector::PromptVector;

use pattern::UserPatternStore;
use std::time::Instant;
use store::{CacheEntry, ExactStore};
use tokio::sync::Mutex;

/// The result of a successful [`SemanticCache::lookup`].
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub response: String,
    pub layer: HitLayer,
}

/// A three-layer semantic cache keyed by `(prompt, user_id, tier)`.
pub struct SemanticCache {
    config: CacheConfig,
    exact: Mutex<ExactStore>,
    patterns: Mutex<UserPatternStore>,
}

impl SemanticCache {
    pub fn new(config: CacheConfig) -> Self {
        let exact = ExactStore::new(config.max_cache_size);
        let patterns = UserPatternStore::new(config.max_patterns_per_user);
        Self {
            config,
            exact: Mutex::new(exact),
            patterns: Mutex::new(patterns),
        }
    }

    /// Probes the exact, similarity, and predictive layers in order.
    pub async fn lookup(&self, prompt: &str, user_id: &str, tier: &str) -> Option<CacheHit> {
        let key = key::exact_key(prompt, user_id, tier);

        {
            let mut exact = self.exact.lock().await;
            if let Some(entry) = exact.get(&key) {
                let response = entry.response();
                drop(exact);
                self.emit_hit(HitLayer::Exact);
                return Some(CacheHit {
                    response,
                    layer: HitLayer::Exact,
                });
            }
        }

        let vector = PromptVector::from_prompt(prompt);
        if !vector.is_empty() {
            let exact = self.exact.lock().await;
            let best = exact
                .iter()
                .filter(|(_, entry)| entry.user_id == user_id && entry.tier == tier && !entry.is_expired())
                .map(|(_, entry)| (vector.cosine_similarity(&entry.prompt_vector), entry))
                .filter(|(sim, _)| *sim > self.config.similarity_threshold)
                .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(_, entry)| entry.response());
            drop(exact);
            if let Some(response) = best {
                self.emit_hit(HitLayer::Similarity);
                return Some(CacheHit {
                    response,
                    layer: HitLayer::Similarity,
                });
            }
        }

        let kind = classify::classify(prompt);
        let predicted_key = {
            let patterns = self.patterns.lock().await;
            patterns.best_match(user_id, kind, &vector, self.config.jaccard_threshold)
        };
        if let Some(predicted_key) = predicted_key {
            let mut exact = self.exact.lock().await;
            if let Some(entry) = exact.get(&predicted_key) {
                let response = entry.response();
                drop(exact);
                self.emit_hit(HitLayer::Predictive);
                return Some(CacheHit {
                    response,
                    layer: HitLayer::Predictive,
                });
            }
        }

        self.emit(CacheEvent::Miss {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
        None
    }

    /// Writes a response, skipping below-threshold quality and
    /// TTL-banding and compressing per configuration.
    pub async fn store(&self, prompt: &str, user_id: &str, tier: &str, response: &str, quality: f64) -> Result<(), CacheError> {
        if quality < self.config.quality_threshold {
            self.emit(CacheEvent::QualitySkipped {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
            });
            return Ok(());
        }

        let ttl = self.config.ttl_for(self.config.quality_band(quality));
        let vector = PromptVector::from_prompt(prompt);
        let key = key::exact_key(prompt, user_id, tier);
        let entry = CacheEntry::new(
            response,
            ttl,
            vector.clone(),
            user_id.to_string(),
            tier.to_string(),
            self.config.compression_threshold_bytes,
        )?;
        let compressed = entry.compressed();

        let evicted = {
            let mut exact = self.exact.lock().await;
            exact.insert(key.clone(), entry);
            exact.evict_over_capacity()
        };
        if evicted > 0 {
            self.emit(CacheEvent::Eviction {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                count: evicted,
            });
        }

        {
            let mut patterns = self.patterns.lock().await;
            let kind = classify::classify(prompt);
            patterns.record(user_id, kind, vector, key);
        }

        self.emit(CacheEvent::Stored {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            compressed,
        });
        Ok(())
    }

    /// Drops expired entries and idle user patterns. Intended to be driven
    /// by a periodic background task alongside the on-insert capacity check.
    pub async fn sweep(&self) -> usize {
        let expired = self.exact.lock().await.remove_expired();
        let idle_users = self.patterns.lock().await.expire_idle();
        let total = expired + idle_users;
        if total > 0 {
            self.emit(CacheEvent::Eviction {
                name: self.config.name.clone(),
                timestamp: Instant::now(),
                count: total,
            });
        }
        total
    }

    fn emit_hit(&self, layer: HitLayer) {
        self.emit(CacheEvent::Hit {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            layer,
        });
    }

    fn emit(&self, event: CacheEvent) {
        self.config.event_listeners.emit(&event);
    }
}
