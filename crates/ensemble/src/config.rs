//! Aggregate configuration for [`crate::EnsembleRunner`].
//!
//! Every enumerated option names a concrete field here; defaults mirror
//! the documented values where specified, and pick a concrete number
//! where only a range or approximation is given (recorded in this
//! crate's design ledger).

use ensemble_cache::CacheConfig;
use std::time::Duration;

/// Per-tier and cross-cutting knobs for one [`crate::EnsembleRunner`].
pub struct EnsembleConfig {
    pub(crate) max_concurrent_requests_free: usize,
    pub(crate) max_concurrent_requests_premium: usize,
    pub(crate) timeout: Duration,
    pub(crate) retry_attempts: usize,
    pub(crate) retry_delay: Duration,
    pub(crate) max_prompt_length: usize,
    pub(crate) max_queue: usize,
    pub(crate) rate_limit_per_hour_free: u32,
    pub(crate) cache: CacheConfig,
    pub(crate) breaker_failure_threshold: u32,
    pub(crate) breaker_reset_timeout: Duration,
    pub(crate) meta_voter_max_tokens: u32,
    pub(crate) meta_voter_timeout: Duration,
    pub(crate) abstain_threshold: f64,
    pub(crate) fan_out_k: usize,
}

impl EnsembleConfig {
    pub fn builder() -> EnsembleConfigBuilder {
        EnsembleConfigBuilder::new()
    }

    pub fn max_concurrent_requests(&self, tier: crate::types::Tier) -> usize {
        match tier {
            crate::types::Tier::Free => self.max_concurrent_requests_free,
            crate::types::Tier::Premium => self.max_concurrent_requests_premium,
        }
    }
}

/// Builder for [`EnsembleConfig`].
pub struct EnsembleConfigBuilder {
    max_concurrent_requests_free: usize,
    max_concurrent_requests_premium: usize,
    timeout: Duration,
    retry_attempts: usize,
    retry_delay: Duration,
    max_prompt_length: usize,
    max_queue: usize,
    rate_limit_per_hour_free: u32,
    cache: CacheConfig,
    breaker_failure_threshold: u32,
    breaker_reset_timeout: Duration,
    meta_voter_max_tokens: u32,
    meta_voter_timeout: Duration,
    abstain_threshold: f64,
    fan_out_k: usize,
}

impl EnsembleConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_concurrent_requests_free: 10,
            max_concurrent_requests_premium: 50,
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(250),
            max_prompt_length: 8_000,
            max_queue: 150,
            rate_limit_per_hour_free: 750,
            cache: CacheConfig::builder().name("ensemble").build(),
            breaker_failure_threshold: 5,
            breaker_reset_timeout: Duration::from_secs(30),
            meta_voter_max_tokens: 1_500,
            meta_voter_timeout: Duration::from_secs(10),
            abstain_threshold: 0.3,
            fan_out_k: 3,
        }
    }

    pub fn max_concurrent_requests_free(mut self, n: usize) -> Self {
        self.max_concurrent_requests_free = n;
        self
    }

    pub fn max_concurrent_requests_premium(mut self, n: usize) -> Self {
        self.max_concurrent_requests_premium = n;
        self
    }

    /// Per-request deadline. Default: 30s.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request-level retry budget, distinct from provider-level retries.
    /// Default: 3.
    pub fn retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Base delay for request-level retry backoff. Default: 250ms.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Default: 8,000 characters.
    pub fn max_prompt_length(mut self, length: usize) -> Self {
        self.max_prompt_length = length;
        self
    }

    /// Default: 150.
    pub fn max_queue(mut self, max_queue: usize) -> Self {
        self.max_queue = max_queue;
        self
    }

    /// Default: 750.
    pub fn rate_limit_per_hour_free(mut self, limit: u32) -> Self {
        self.rate_limit_per_hour_free = limit;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn breaker_failure_threshold(mut self, n: u32) -> Self {
        self.breaker_failure_threshold = n;
        self
    }

    pub fn breaker_reset_timeout(mut self, timeout: Duration) -> Self {
        self.breaker_reset_timeout = timeout;
        self
    }

    pub fn meta_voter_max_tokens(mut self, tokens: u32) -> Self {
        self.meta_voter_max_tokens = tokens;
        self
    }

    pub fn meta_voter_timeout(mut self, timeout: Duration) -> Self {
        self.meta_voter_timeout = timeout;
        self
    }

    /// Default: 0.3.
    pub fn abstain_threshold(mut self, threshold: f64) -> Self {
        self.abstain_threshold = threshold;
        self
    }

    /// Number of models selected per request. Default: 3.
    pub fn fan_out_k(mut self, k: usize) -> Self {
        self.fan_out_k = k;
        self
    }

    pub fn build(self) -> EnsembleConfig {
        EnsembleConfig {
            max_concurrent_requests_free: self.max_concurrent_requests_free,
            max_concurrent_requests_premium: self.max_concurrent_requests_premium,
            timeout: self.timeout,
            retry_attempts: self.retry_attempts,
            retry_delay: self.retry_delay,
            max_prompt_length: self.max_prompt_length,
            max_queue: self.max_queue,
            rate_limit_per_hour_free: self.rate_limit_per_hour_free,
            cache: self.cache,
            breaker_failure_threshold: self.breaker_failure_threshold,
            breaker_reset_timeout: self.breaker_reset_timeout,
            meta_voter_max_tokens: self.meta_voter_max_tokens,
            meta_voter_timeout: self.meta_voter_timeout,
            abstain_threshold: self.abstain_threshold,
            fan_out_k: self.fan_out_k,
        }
    }
}

impl Default for EnsembleConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
