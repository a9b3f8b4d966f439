//! Configuration for [`crate::SemanticCache`].

use crate::events::CacheEvent;
use ensemble_core::{EventListeners, FnListener};
use std::time::Duration;

/// TTL band assigned to a write, chosen by the quality score supplied at
/// write time: higher-quality responses are worth keeping around longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityBand {
    High,
    Medium,
    Low,
}

/// Configuration for a [`crate::SemanticCache`].
#[derive(Clone)]
pub struct CacheConfig {
    pub(crate) max_cache_size: usize,
    pub(crate) similarity_threshold: f64,
    pub(crate) jaccard_threshold: f64,
    pub(crate) quality_threshold: f64,
    pub(crate) compression_threshold_bytes: usize,
    pub(crate) ttl_high: Duration,
    pub(crate) ttl_medium: Duration,
    pub(crate) ttl_low: Duration,
    pub(crate) max_patterns_per_user: usize,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
    pub(crate) name: String,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    pub(crate) fn quality_band(&self, quality: f64) -> QualityBand {
        if quality >= 0.8 {
            QualityBand::High
        } else if quality >= 0.5 {
            QualityBand::Medium
        } else {
            QualityBand::Low
        }
    }

    pub(crate) fn ttl_for(&self, band: QualityBand) -> Duration {
        match band {
            QualityBand::High => self.ttl_high,
            QualityBand::Medium => self.ttl_medium,
            QualityBand::Low => self.ttl_low,
        }
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    max_cache_size: usize,
    similarity_threshold: f64,
    jaccard_threshold: f64,
    quality_threshold: f64,
    compression_threshold_bytes: usize,
    ttl_high: Duration,
    ttl_medium: Duration,
    ttl_low: Duration,
    max_patterns_per_user: usize,
    event_listeners: EventListeners<CacheEvent>,
    name: String,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_cache_size: 10_000,
            similarity_threshold: 0.85,
            jaccard_threshold: 0.7,
            quality_threshold: 0.3,
            compression_threshold_bytes: 2048,
            ttl_high: Duration::from_secs(24 * 60 * 60),
            ttl_medium: Duration::from_secs(6 * 60 * 60),
            ttl_low: Duration::from_secs(60 * 60),
            max_patterns_per_user: 50,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Maximum number of exact-layer entries retained before eviction drops
    /// the oldest 20%. Default: 10,000.
    pub fn max_cache_size(mut self, size: usize) -> Self {
        self.max_cache_size = size;
        self
    }

    /// Minimum cosine similarity for a similarity-layer hit. Default: 0.85.
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Minimum Jaccard similarity for a predictive-layer hit. Default: 0.7.
    pub fn jaccard_threshold(mut self, threshold: f64) -> Self {
        self.jaccard_threshold = threshold;
        self
    }

    /// Minimum quality score for a write to be retained. Writes below this
    /// are silently skipped. Default: 0.3.
    pub fn quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Payload size, in bytes, above which writes are gzip-compressed.
    /// Default: 2048.
    pub fn compression_threshold_bytes(mut self, bytes: usize) -> Self {
        self.compression_threshold_bytes = bytes;
        self
    }

    /// TTL applied to writes in the high quality band (`>= 0.8`).
    pub fn ttl_high(mut self, ttl: Duration) -> Self {
        self.ttl_high = ttl;
        self
    }

    /// TTL applied to writes in the medium quality band (`>= 0.5`).
    pub fn ttl_medium(mut self, ttl: Duration) -> Self {
        self.ttl_medium = ttl;
        self
    }

    /// TTL applied to writes in the low quality band (`< 0.5`).
    pub fn ttl_low(mut self, ttl: Duration) -> Self {
        self.ttl_low = ttl;
        self
    }

    /// Maximum queries retained per user for the predictive layer.
    /// Default: 50.
    pub fn max_patterns_per_user(mut self, max: usize) -> Self {
        self.max_patterns_per_user = max;
        self
    }

    /// Sets the name of this cache instance for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback fired on every [`CacheEvent::Hit`].
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Hit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback fired on every [`CacheEvent::Miss`].
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Miss { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback fired on every [`CacheEvent::Eviction`].
    pub fn on_eviction<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Eviction { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> CacheConfig {
        CacheConfig {
            max_cache_size: self.max_cache_size,
            similarity_threshold: self.similarity_threshold,
            jaccard_threshold: self.jaccard_threshold,
            quality_threshold: self.quality_threshold,
            compression_threshold_bytes: self.compression_threshold_bytes,
            ttl_high: self.ttl_high,
            ttl_medium: self.ttl_medium,
            ttl_low: self.ttl_low,
            max_patterns_per_user: self.max_patterns_per_user,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = CacheConfig::builder().build();
        assert_eq!(config.max_cache_size, 10_000);
        assert!((config.similarity_threshold - 0.85).abs() < 1e-9);
        assert!((config.jaccard_threshold - 0.7).abs() < 1e-9);
    }

    #[test]
    fn builder_custom_values() {
        let config = CacheConfig::builder()
            .max_cache_size(500)
            .similarity_threshold(0.9)
            .quality_threshold(0.5)
            .name("my-cache")
            .build();
        assert_eq!(config.max_cache_size, 500);
        assert!((config.similarity_threshold - 0.9).abs() < 1e-9);
        assert_eq!(config.name, "my-cache");
    }

    #[test]
    fn quality_band_thresholds() {
        let config = CacheConfig::builder().build();
        assert_eq!(config.quality_band(0.9), QualityBand::High);
        assert_eq!(config.quality_band(0.6), QualityBand::Medium);
        assert_eq!(config.quality_band(0.1), QualityBand::Low);
    }

    #[test]
    fn event_listeners_can_be_registered() {
        let _config = CacheConfig::builder().on_hit(|| {}).on_miss(|| {}).on_eviction(|| {}).build();
    }
}
