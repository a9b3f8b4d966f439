//! Events emitted by [`crate::fan_out`].

use ensemble_core::EnsembleEvent;
use std::time::Instant;

/// An event emitted over the lifetime of a single fan-out round.
#[derive(Debug, Clone)]
pub enum FanoutEvent {
    /// A task completed (success or error) before the deadline.
    TaskSettled { name: String, timestamp: Instant, model: String },
    /// A task was still running when the deadline fired and was cancelled.
    TaskCancelled { name: String, timestamp: Instant, model: String },
    /// Every task in the round either errored or was cancelled.
    AllFailed { name: String, timestamp: Instant, attempted: usize },
}

impl EnsembleEvent for FanoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FanoutEvent::TaskSettled { .. } => "task_settled",
            FanoutEvent::TaskCancelled { .. } => "task_cancelled",
            FanoutEvent::AllFailed { .. } => "all_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FanoutEvent::TaskSettled { timestamp, .. } | FanoutEvent::TaskCancelled { timestamp, .. } | FanoutEvent::AllFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            FanoutEvent::TaskSettled { name, .. } | FanoutEvent::TaskCancelled { name, .. } | FanoutEvent::AllFailed { name, .. } => name,
        }
    }
}
