//! Availability-aware model selection for the ensemble orchestration
//! runtime.
//!
//! [`ModelRouter::select`] classifies the incoming prompt, scores every
//! available candidate across five dimensions (performance, cost,
//! specialty, reliability, load), diversifies the winners across distinct
//! providers, and reserves a load slot on each selected model. Selection
//! never panics and never returns nothing: if every candidate is filtered
//! out, a fixed `[cheap, medium, safer]` fallback triple is returned
//! instead.
//!
//! ```rust
//! use ensemble_router::{ModelDescriptor, ModelRouter, ModelRuntimeState, RequestKind};
//! use std::sync::Arc;
//!
//! let fallback = [
//!     ModelDescriptor::new("cheap", "acme", RequestKind::General),
//!     ModelDescriptor::new("medium", "acme", RequestKind::General),
//!     ModelDescriptor::new("safer", "globex", RequestKind::General),
//! ];
//! let mut router = ModelRouter::new(fallback);
//! router.register(
//!     ModelDescriptor::new("gpt-x", "acme", RequestKind::Technical),
//!     Arc::new(ModelRuntimeState::new()),
//! );
//!
//! let selections = router.select("debug this stack trace", "free", 1, |_id| true);
//! assert_eq!(selections[0].model.id, "gpt-x");
//! ```

mod classify;
mod model;
mod router;
mod scoring;

pub use classify::{classify, RequestKind};
pub use model::{ModelDescriptor, ModelRuntimeState};
pub use router::{ModelRouter, Selection};
pub use scoring::{score, tier_budget, ScoreBreakdown};
