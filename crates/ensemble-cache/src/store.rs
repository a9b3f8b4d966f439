//! Backing storage for the exact and similarity lookup layers.

use crate::error::CacheError;
use crate::vector::PromptVector;
use flate2::write::GzEncoder;
use flate2::read::GzDecoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// A single cached response, addressable by its exact key and, for the
/// similarity layer, by its prompt vector.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    payload: Vec<u8>,
    compressed: bool,
    created_at: Instant,
    ttl: Duration,
    pub(crate) prompt_vector: PromptVector,
    pub(crate) user_id: String,
    pub(crate) tier: String,
}

impl CacheEntry {
    pub(crate) fn new(
        response: &str,
        ttl: Duration,
        prompt_vector: PromptVector,
        user_id: String,
        tier: String,
        compression_threshold_bytes: usize,
    ) -> Result<Self, CacheError> {
        let raw = response.as_bytes();
        let (payload, compressed) = if raw.len() > compression_threshold_bytes {
            (gzip(raw).map_err(CacheError::Compression)?, true)
        } else {
            (raw.to_vec(), false)
        };

        Ok(Self {
            payload,
            compressed,
            created_at: Instant::now(),
            ttl,
            prompt_vector,
            user_id,
            tier,
        })
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }

    pub(crate) fn compressed(&self) -> bool {
        self.compressed
    }

    pub(crate) fn response(&self) -> String {
        if self.compressed {
            gunzip(&self.payload).unwrap_or_default()
        } else {
            String::from_utf8_lossy(&self.payload).into_owned()
        }
    }
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn gunzip(data: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(data);
    let mut out = String::new();
    decoder.read_to_string(&mut out)?;
    Ok(out)
}

/// Exact-key store backing the exact and similarity lookup layers.
///
/// Eviction is a single fixed policy: when over `max_size`, drop the oldest
/// 20% of entries by `created_at`, rather than a pluggable per-item policy.
/// This matches the bulk reclaim a request-scoped cache needs, rather than
/// evicting one entry per insert.
pub(crate) struct ExactStore {
    entries: HashMap<String, CacheEntry>,
    max_size: usize,
}

impl ExactStore {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
        }
    }

    pub(crate) fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        if self.entries.get(key)?.is_expired() {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key)
    }

    pub(crate) fn insert(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    /// Drops the oldest 20% of entries if the store is over `max_size`.
    /// Returns the number evicted.
    pub(crate) fn evict_over_capacity(&mut self) -> usize {
        if self.entries.len() <= self.max_size {
            return 0;
        }

        let mut by_age: Vec<(String, Instant)> =
            self.entries.iter().map(|(k, v)| (k.clone(), v.created_at())).collect();
        by_age.sort_by_key(|(_, created_at)| *created_at);

        let drop_count = (self.entries.len() as f64 * 0.2).ceil() as usize;
        for (key, _) in by_age.into_iter().take(drop_count) {
            self.entries.remove(&key);
        }
        drop_count
    }

    pub(crate) fn remove_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }
}
