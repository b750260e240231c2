//! Per-user affinity learned from feedback.

use crate::context::ScoringContext;
use crate::scorer::SignalTag;
use crate::traits::Signal;
use dashmap::DashMap;
use data_source::{EntityId, FeedbackEvent, FeedbackKind, UserId};
use sources::Candidate;
use std::sync::Arc;
use tracing::debug;

/// How much a single feedback event moves the user's affinity for an entity.
pub fn feedback_delta(kind: FeedbackKind) -> f32 {
    match kind {
        FeedbackKind::Like => 0.25,
        FeedbackKind::Clicked => 0.10,
        FeedbackKind::Dislike => -0.25,
        FeedbackKind::NotInterested => -0.40,
    }
}

/// Concurrent (user, entity) -> affinity map, each value kept in [-1, 1].
///
/// Shared between the engine (which nudges it on feedback) and the
/// [`AffinitySignal`] (which reads it while scoring).
#[derive(Debug, Default)]
pub struct AffinityModel {
    scores: DashMap<(UserId, EntityId), f32>,
}

impl AffinityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str, entity_id: &str) -> Option<f32> {
        self.scores
            .get(&(user_id.to_string(), entity_id.to_string()))
            .map(|v| *v)
    }

    /// Move the affinity by `delta`, clamping to [-1, 1]. Returns the new value.
    pub fn nudge(&self, user_id: &str, entity_id: &str, delta: f32) -> f32 {
        let mut entry = self
            .scores
            .entry((user_id.to_string(), entity_id.to_string()))
            .or_insert(0.0);
        *entry = (*entry + delta).clamp(-1.0, 1.0);
        *entry
    }

    /// Replace everything known about `user_id` with a replay of `events`.
    ///
    /// Events are applied in timestamp order.
    pub fn rebuild_user(&self, user_id: &str, events: &[FeedbackEvent]) {
        self.scores.retain(|(user, _), _| user != user_id);

        let mut ordered: Vec<&FeedbackEvent> = events.iter().filter(|e| e.user_id == user_id).collect();
        ordered.sort_by_key(|e| e.timestamp);
        for event in &ordered {
            self.nudge(user_id, &event.recommendation_id, feedback_delta(event.feedback));
        }
        debug!("Rebuilt affinity for {} from {} events", user_id, ordered.len());
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Reads the requesting user's affinity for each candidate.
///
/// Unavailable (rather than zero) for entities the user never rated.
pub struct AffinitySignal {
    model: Arc<AffinityModel>,
}

impl AffinitySignal {
    pub fn new(model: Arc<AffinityModel>) -> Self {
        Self { model }
    }
}

impl Signal for AffinitySignal {
    fn tag(&self) -> SignalTag {
        SignalTag::Affinity
    }

    fn evaluate(&self, candidate: &Candidate, context: &ScoringContext) -> Option<f32> {
        self.model.get(&context.user_id, candidate.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candidate;
    use chrono::{Duration, Utc};

    #[test]
    fn test_nudge_clamps() {
        let model = AffinityModel::new();
        for _ in 0..10 {
            model.nudge("u1", "p1", feedback_delta(FeedbackKind::Like));
        }
        assert_eq!(model.get("u1", "p1"), Some(1.0));

        for _ in 0..10 {
            model.nudge("u1", "p1", feedback_delta(FeedbackKind::NotInterested));
        }
        assert_eq!(model.get("u1", "p1"), Some(-1.0));
    }

    #[test]
    fn test_signal_is_per_user() {
        let model = Arc::new(AffinityModel::new());
        model.nudge("u1", "p1", 0.5);
        let signal = AffinitySignal::new(model);

        assert_eq!(signal.evaluate(&candidate("p1", 0.5), &ScoringContext::new("u1")), Some(0.5));
        assert_eq!(signal.evaluate(&candidate("p1", 0.5), &ScoringContext::new("u2")), None);
        assert_eq!(signal.evaluate(&candidate("p2", 0.5), &ScoringContext::new("u1")), None);
    }

    #[test]
    fn test_rebuild_user_replays_in_order() {
        let model = AffinityModel::new();
        model.nudge("u1", "stale", 0.9);
        model.nudge("u2", "p1", 0.3);

        let now = Utc::now();
        let event = |id: &str, kind, offset: i64| FeedbackEvent {
            user_id: "u1".to_string(),
            recommendation_id: id.to_string(),
            feedback: kind,
            timestamp: now + Duration::seconds(offset),
        };
        let events = vec![event("p1", FeedbackKind::Like, 2), event("p1", FeedbackKind::Clicked, 1)];

        model.rebuild_user("u1", &events);

        assert_eq!(model.get("u1", "stale"), None);
        assert!((model.get("u1", "p1").unwrap() - 0.35).abs() < 1e-6);
        assert_eq!(model.get("u2", "p1"), Some(0.3));
    }
}
