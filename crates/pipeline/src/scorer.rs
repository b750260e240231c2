//! Weighted multi-signal scoring.
//!
//! Each candidate's score is its base popularity times `base` weight, plus
//! the weighted value of every available signal:
//!
//! ```text
//! score = w_base * popularity + Σ w_i * signal_i
//! ```
//!
//! Signals that are unavailable contribute nothing. Scoring runs in
//! parallel across candidates with rayon.

use crate::context::ScoringContext;
use crate::signals::{AffinityModel, AffinitySignal, ProximitySignal, RecencySignal, RelevanceSignal};
use crate::traits::Signal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sources::Candidate;
use std::sync::Arc;

/// Names a contribution to a candidate's score; surfaced as a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTag {
    Popularity,
    Proximity,
    TopicalRelevance,
    Recency,
    Affinity,
}

impl SignalTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTag::Popularity => "popularity",
            SignalTag::Proximity => "proximity",
            SignalTag::TopicalRelevance => "topical_relevance",
            SignalTag::Recency => "recency",
            SignalTag::Affinity => "affinity",
        }
    }
}

impl std::fmt::Display for SignalTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative weight of each signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: f32,
    pub proximity: f32,
    pub relevance: f32,
    pub recency: f32,
    pub affinity: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            proximity: 0.3,
            relevance: 0.5,
            recency: 0.2,
            affinity: 0.6,
        }
    }
}

impl ScoringWeights {
    pub fn for_tag(&self, tag: SignalTag) -> f32 {
        match tag {
            SignalTag::Popularity => self.base,
            SignalTag::Proximity => self.proximity,
            SignalTag::TopicalRelevance => self.relevance,
            SignalTag::Recency => self.recency,
            SignalTag::Affinity => self.affinity,
        }
    }

    /// All weights must be finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.base, self.proximity, self.relevance, self.recency, self.affinity]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// A candidate with its final score and the signals that raised it.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f32,
    pub reasons: Vec<SignalTag>,
}

/// Combines weighted signals into a single score per candidate.
pub struct Scorer {
    base_weight: f32,
    signals: Vec<(Box<dyn Signal>, f32)>,
}

impl Scorer {
    /// A scorer with only the base popularity term.
    pub fn new(base_weight: f32) -> Self {
        Self {
            base_weight,
            signals: Vec::new(),
        }
    }

    /// The full signal set, reading affinity from `affinity`.
    pub fn standard(weights: ScoringWeights, recency_half_life_days: f64, affinity: Arc<AffinityModel>) -> Self {
        Self::new(weights.base)
            .add_signal(ProximitySignal::default(), weights.proximity)
            .add_signal(RelevanceSignal, weights.relevance)
            .add_signal(RecencySignal::new(recency_half_life_days), weights.recency)
            .add_signal(AffinitySignal::new(affinity), weights.affinity)
    }

    /// Add a signal with its weight (builder pattern).
    pub fn add_signal(mut self, signal: impl Signal + 'static, weight: f32) -> Self {
        self.signals.push((Box::new(signal), weight));
        self
    }

    /// Score all candidates in parallel, preserving input order.
    pub fn score(&self, candidates: Vec<Candidate>, context: &ScoringContext) -> Vec<ScoredCandidate> {
        candidates
            .into_par_iter()
            .map(|candidate| self.score_single(candidate, context))
            .collect()
    }

    fn score_single(&self, candidate: Candidate, context: &ScoringContext) -> ScoredCandidate {
        let mut reasons = Vec::new();

        let base = self.base_weight * candidate.base_score;
        if base > 0.0 {
            reasons.push(SignalTag::Popularity);
        }

        let mut score = base;
        for (signal, weight) in &self.signals {
            let Some(value) = signal.evaluate(&candidate, context) else {
                continue;
            };
            let contribution = weight * value;
            score += contribution;
            if contribution > 0.0 {
                reasons.push(signal.tag());
            }
        }

        ScoredCandidate {
            candidate,
            score,
            reasons,
        }
    }
}
