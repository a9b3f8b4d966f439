//! The external collaborators `EnsembleRunner` depends on but does not
//! implement: the memory store, the synthesizer, and the observer. All
//! three are injected; this crate carries no opinion about a provider's
//! wire protocol, persistence backend, or logging sink.
//!
//! A model's call surface is not a named trait here: it is the literal
//! `tower::Service<ModelCall, Response = ModelReply, Error = EnsembleError>`
//! bound wherever [`crate::registry::ModelRegistry::register`] accepts one.
//! `Clone` isn't object-safe, so there is no `dyn ModelClient` — every
//! concrete client is composed behind a circuit breaker and retry layer
//! and then type-erased via `tower::util::BoxCloneService` instead.

use crate::types::{LogLevel, Memory, RoleResult, SynthesisOutcome};
use async_trait::async_trait;
use ensemble_core::EnsembleError;
use std::collections::HashMap;

/// Best-effort session/long-term memory. Every method degrades to an empty
/// result on failure rather than propagating an error: a memory outage must
/// never fail a request.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Returns recent context for `(user_id, session_id)`, truncated to
    /// roughly `max_tokens`. Empty string on any failure.
    async fn get_context(&self, user_id: &str, session_id: &str, max_tokens: u32) -> String;

    /// Records one turn of the conversation. Returns an opaque id on
    /// success; failures are swallowed by the caller, not by this trait,
    /// so implementations may still return `Err`.
    async fn store(&self, user_id: &str, session_id: &str, content: &str, is_user_prompt: bool, quality: f64, model: &str) -> Result<String, EnsembleError>;

    /// Free-text recall across stored memories, newest/most-relevant first.
    async fn retrieve(&self, query: &str) -> Vec<Memory>;
}

/// Produces one unified answer from a request's fulfilled role results.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, prompt: &str, roles: &[RoleResult]) -> Result<SynthesisOutcome, EnsembleError>;
}

/// Structured logging sink. Deliberately synchronous and non-blocking:
/// an `Observer` implementation that needs to buffer or ship logs
/// asynchronously owns that complexity itself.
pub trait Observer: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, fields: &HashMap<String, String>, correlation_id: &str);
}

/// An [`Observer`] that discards everything. Used as the runner's default
/// so constructing one never requires wiring a real sink.
pub struct NullObserver;

impl Observer for NullObserver {
    fn log(&self, _level: LogLevel, _msg: &str, _fields: &HashMap<String, String>, _correlation_id: &str) {}
}

/// A [`MemoryStore`] that stores nothing and recalls nothing. Context
/// retrieval is best-effort by contract, so "always empty" is a valid,
/// honest implementation — useful as a default for callers with no
/// memory backend.
pub struct NullMemoryStore;

#[async_trait]
impl MemoryStore for NullMemoryStore {
    async fn get_context(&self, _user_id: &str, _session_id: &str, _max_tokens: u32) -> String {
        String::new()
    }

    async fn store(&self, _user_id: &str, _session_id: &str, _content: &str, _is_user_prompt: bool, _quality: f64, _model: &str) -> Result<String, EnsembleError> {
        Ok(String::new())
    }

    async fn retrieve(&self, _query: &str) -> Vec<Memory> {
        Vec::new()
    }
}
