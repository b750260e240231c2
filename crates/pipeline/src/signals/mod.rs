//! Scoring signals combined by the [`Scorer`](crate::Scorer).

pub mod affinity;
pub mod proximity;
pub mod recency;
pub mod relevance;

pub use affinity::{AffinityModel, AffinitySignal, feedback_delta};
pub use proximity::ProximitySignal;
pub use recency::RecencySignal;
pub use relevance::RelevanceSignal;
