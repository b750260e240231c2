//! Core traits for the ranking pipeline.
//!
//! - [`Filter`] removes candidates that must never be shown
//! - [`Signal`] measures one independent aspect of a candidate's fit

use crate::context::ScoringContext;
use crate::scorer::SignalTag;
use resilience::Result;
use sources::Candidate;

/// Core trait for filtering candidates.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared across concurrent requests
/// - Filters take ownership of the Vec<Candidate> and return a filtered Vec
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    fn apply(&self, candidates: Vec<Candidate>, context: &ScoringContext) -> Result<Vec<Candidate>>;
}

/// A single weighted scoring signal.
///
/// `evaluate` returns `None` when the signal is unavailable for this
/// candidate or request (no location, no query, never rated). The scorer
/// then adds nothing for it; `Some(0.0)` is a real, measured zero.
pub trait Signal: Send + Sync {
    fn tag(&self) -> SignalTag;

    fn evaluate(&self, candidate: &Candidate, context: &ScoringContext) -> Option<f32>;
}
