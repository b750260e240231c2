//! Recency signal.
//!
//! Favors entities whose profile or content changed recently, decaying
//! exponentially with age.

use crate::context::ScoringContext;
use crate::scorer::SignalTag;
use crate::traits::Signal;
use sources::Candidate;

/// Scores candidates by how recently they were updated.
///
/// ## Algorithm
/// 1. Skip candidates with no `updated_at` (signal unavailable)
/// 2. Compute age in days relative to the context's `now` (future dates count as 0)
/// 3. Score = 0.5 ^ (age / half_life_days)
pub struct RecencySignal {
    half_life_days: f64,
}

impl RecencySignal {
    pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

    /// Create a new RecencySignal.
    ///
    /// # Arguments
    /// * `half_life_days` - Age at which the score halves (non-positive falls back to the default)
    pub fn new(half_life_days: f64) -> Self {
        let half_life_days = if half_life_days > 0.0 {
            half_life_days
        } else {
            Self::DEFAULT_HALF_LIFE_DAYS
        };
        Self { half_life_days }
    }
}

impl Default for RecencySignal {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HALF_LIFE_DAYS)
    }
}

impl Signal for RecencySignal {
    fn tag(&self) -> SignalTag {
        SignalTag::Recency
    }

    fn evaluate(&self, candidate: &Candidate, context: &ScoringContext) -> Option<f32> {
        let updated_at = candidate.entity.updated_at?;
        let age_days = (context.now - updated_at).num_seconds().max(0) as f64 / 86_400.0;
        Some(0.5f64.powf(age_days / self.half_life_days) as f32)
    }
}
