//! Configuration for [`crate::VotingEngine`].

use crate::events::VotingEvent;
use ensemble_core::{EventListeners, FnListener};

/// Configuration for a [`crate::VotingEngine`].
pub struct VotingConfig {
    pub(crate) abstain_threshold: f64,
    pub(crate) event_listeners: EventListeners<VotingEvent>,
    pub(crate) name: String,
}

impl VotingConfig {
    pub fn builder() -> VotingConfigBuilder {
        VotingConfigBuilder::new()
    }
}

/// Builder for [`VotingConfig`].
pub struct VotingConfigBuilder {
    abstain_threshold: f64,
    event_listeners: EventListeners<VotingEvent>,
    name: String,
}

impl VotingConfigBuilder {
    pub fn new() -> Self {
        Self {
            abstain_threshold: crate::abstain::ABSTAIN_THRESHOLD,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Post-tie-break confidence below which a `very-weak` consensus
    /// recommends abstention. Default: `0.3`.
    pub fn abstain_threshold(mut self, threshold: f64) -> Self {
        self.abstain_threshold = threshold;
        self
    }

    /// Sets the name of this voting engine instance for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback fired whenever the tie-break cascade runs.
    pub fn on_tie_break<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, VotingEvent::TieBroken { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback fired whenever the engine recommends abstaining.
    pub fn on_abstain<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, VotingEvent::Abstained { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> VotingConfig {
        VotingConfig {
            abstain_threshold: self.abstain_threshold,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for VotingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = VotingConfig::builder().build();
        assert!((config.abstain_threshold - 0.3).abs() < 1e-9);
    }

    #[test]
    fn builder_custom_values() {
        let config = VotingConfig::builder().abstain_threshold(0.4).name("primary-vote").build();
        assert!((config.abstain_threshold - 0.4).abs() < 1e-9);
        assert_eq!(config.name, "primary-vote");
    }
}
