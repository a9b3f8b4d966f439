//! Events emitted by a [`crate::SemanticCache`].

use ensemble_core::EnsembleEvent;
use std::time::Instant;

/// Which of the three lookup layers produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitLayer {
    /// Exact sha256 key match.
    Exact,
    /// Cosine similarity over sparse prompt vectors.
    Similarity,
    /// Jaccard similarity over a user's recent same-kind queries.
    Predictive,
}

/// An event emitted over the lifetime of a [`crate::SemanticCache`].
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A lookup was satisfied by one of the three layers.
    Hit {
        name: String,
        timestamp: Instant,
        layer: HitLayer,
    },
    /// A lookup missed all three layers.
    Miss { name: String, timestamp: Instant },
    /// A write was skipped because the supplied quality fell below the
    /// configured threshold.
    QualitySkipped { name: String, timestamp: Instant },
    /// A response was written into the cache.
    Stored {
        name: String,
        timestamp: Instant,
        compressed: bool,
    },
    /// One or more entries were dropped to bring the cache back under its
    /// size limit, or a stale user pattern was expired.
    Eviction {
        name: String,
        timestamp: Instant,
        count: usize,
    },
}

impl EnsembleEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::QualitySkipped { .. } => "quality_skipped",
            CacheEvent::Stored { .. } => "stored",
            CacheEvent::Eviction { .. } => "eviction",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::QualitySkipped { timestamp, .. }
            | CacheEvent::Stored { timestamp, .. }
            | CacheEvent::Eviction { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            CacheEvent::Hit { name, .. }
            | CacheEvent::Miss { name, .. }
            | CacheEvent::QualitySkipped { name, .. }
            | CacheEvent::Stored { name, .. }
            | CacheEvent::Eviction { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_distinct() {
        let now = Instant::now();
        let hit = CacheEvent::Hit {
            name: "semantic-cache".into(),
            timestamp: now,
            layer: HitLayer::Similarity,
        };
        assert_eq!(hit.event_type(), "hit");
        assert_eq!(hit.source_name(), "semantic-cache");

        let miss = CacheEvent::Miss {
            name: "semantic-cache".into(),
            timestamp: now,
        };
        assert_eq!(miss.event_type(), "miss");

        let stored = CacheEvent::Stored {
            name: "semantic-cache".into(),
            timestamp: now,
            compressed: true,
        };
        assert_eq!(stored.event_type(), "stored");

        let eviction = CacheEvent::Eviction {
            name: "semantic-cache".into(),
            timestamp: now,
            count: 3,
        };
        assert_eq!(eviction.event_type(), "eviction");
    }
}
