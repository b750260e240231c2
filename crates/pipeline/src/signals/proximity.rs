//! Contextual proximity signal.

use crate::context::ScoringContext;
use crate::scorer::SignalTag;
use crate::traits::Signal;
use sources::Candidate;

/// Scores candidates by distance between the caller and the entity.
///
/// Available only when both the request and the entity carry a location.
/// Score = 1 / (1 + distance_km / scale_km), so an entity `scale_km` away
/// scores 0.5.
pub struct ProximitySignal {
    scale_km: f64,
}

impl ProximitySignal {
    pub const DEFAULT_SCALE_KM: f64 = 50.0;

    pub fn new(scale_km: f64) -> Self {
        let scale_km = if scale_km > 0.0 {
            scale_km
        } else {
            Self::DEFAULT_SCALE_KM
        };
        Self { scale_km }
    }
}

impl Default for ProximitySignal {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SCALE_KM)
    }
}

impl Signal for ProximitySignal {
    fn tag(&self) -> SignalTag {
        SignalTag::Proximity
    }

    fn evaluate(&self, candidate: &Candidate, context: &ScoringContext) -> Option<f32> {
        let here = context.request_context.location?;
        let there = candidate.entity.location?;
        let distance = here.distance_km(&there);
        Some((1.0 / (1.0 + distance / self.scale_km)) as f32)
    }
}
