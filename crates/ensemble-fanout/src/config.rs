//! Configuration for [`crate::fan_out`].

use crate::events::FanoutEvent;
use ensemble_core::EventListeners;

/// Configuration for a fan-out round.
pub struct FanoutConfig {
    pub(crate) event_listeners: EventListeners<FanoutEvent>,
    pub(crate) name: String,
}

impl FanoutConfig {
    pub fn builder() -> FanoutConfigBuilder {
        FanoutConfigBuilder::new()
    }
}

/// Builder for [`FanoutConfig`].
pub struct FanoutConfigBuilder {
    event_listeners: EventListeners<FanoutEvent>,
    name: String,
}

impl FanoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the name of this fan-out round for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a listener that receives every [`FanoutEvent`].
    pub fn on_event<L>(mut self, listener: L) -> Self
    where
        L: ensemble_core::EventListener<FanoutEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    pub fn build(self) -> FanoutConfig {
        FanoutConfig {
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for FanoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
