//! Filtering, scoring and ranking of recommendation candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Signals and the weighted Scorer
//! - Ranking into the final recommendation list
//!
//! ## Architecture
//! The pipeline processes candidates in stages:
//! 1. Filters remove candidates that must never be shown (excluded ids, the entity being viewed)
//! 2. The Scorer combines popularity with proximity, relevance, recency and affinity
//! 3. `rank` sorts by score and truncates to the requested limit
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{rank, FilterPipeline, Scorer, ScoringContext, ScoringWeights};
//!
//! let pipeline = FilterPipeline::standard();
//! let scorer = Scorer::standard(ScoringWeights::default(), 30.0, affinity.clone());
//!
//! let filtered = pipeline.apply(candidates, &context)?;
//! let ranked = rank(scorer.score(filtered, &context), 10);
//! ```

pub mod context;
pub mod filter_pipeline;
pub mod filters;
pub mod ranking;
pub mod scorer;
pub mod signals;
pub mod traits;

// Re-export main types
pub use context::ScoringContext;
pub use filter_pipeline::FilterPipeline;
pub use ranking::{rank, Recommendation, RecommendationResult};
pub use scorer::{ScoredCandidate, Scorer, ScoringWeights, SignalTag};
pub use signals::{feedback_delta, AffinityModel};
pub use traits::{Filter, Signal};

#[cfg(test)]
pub(crate) mod test_support {
    use data_source::{CatalogEntity, EntityKind};
    use sources::Candidate;

    /// A politician named after its id with `score` as popularity.
    pub fn candidate(id: &str, score: f32) -> Candidate {
        Candidate::new(CatalogEntity::new(id, EntityKind::Politician, id).with_popularity(score))
    }
}
