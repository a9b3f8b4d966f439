//! Core infrastructure shared across the ensemble orchestration crates.
//!
//! - [`events`]: the observer-pattern event bus each subsystem uses to
//!   report state transitions, hits, and rejections.
//! - [`error`]: the closed [`error::EnsembleError`] taxonomy and its
//!   retry/circuit-breaker classification.
//! - [`ring`]: a bounded ring buffer for per-model call history.

pub mod error;
pub mod events;
pub mod ring;

pub use error::EnsembleError;
pub use events::{EnsembleEvent, EventListener, EventListeners, FnListener};
pub use ring::{RingBuffer, Sample};
