//! Final ordering and truncation.

use crate::scorer::{ScoredCandidate, SignalTag};
use data_source::EntityId;
use serde::Serialize;
use std::cmp::Ordering;

/// One ranked entry returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub entity_id: EntityId,
    pub score: f32,
    pub reasons: Vec<SignalTag>,
}

pub type RecommendationResult = Vec<Recommendation>;

/// Order by score descending (ties by id ascending) and keep the top `limit`.
pub fn rank(mut scored: Vec<ScoredCandidate>, limit: usize) -> RecommendationResult {
    scored.sort_by(compare);
    scored
        .into_iter()
        .take(limit)
        .map(|s| Recommendation {
            entity_id: s.candidate.entity.id,
            score: s.score,
            reasons: s.reasons,
        })
        .collect()
}

fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.candidate.id().cmp(b.candidate.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candidate;
    use proptest::prelude::*;

    fn scored(id: &str, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            candidate: candidate(id, score),
            score,
            reasons: vec![SignalTag::Popularity],
        }
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let ranked = rank(vec![scored("b", 0.5), scored("c", 0.9), scored("a", 0.5)], 2);
        let ids: Vec<&str> = ranked.iter().map(|r| r.entity_id.as_str()).collect();
        assert_eq!(ids, ["c", "a"]);
    }

    #[test]
    fn test_rank_fewer_than_limit() {
        assert_eq!(rank(vec![scored("a", 0.1)], 10).len(), 1);
        assert!(rank(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(&rank(vec![scored("p1", 0.5)], 1)[0]).unwrap();
        assert_eq!(json["entityId"], "p1");
        assert_eq!(json["reasons"][0], "popularity");
    }

    proptest! {
        // Scores sit on a coarse grid and ids repeat, so ties are common
        #[test]
        fn prop_rank_is_sorted_and_bounded(
            pool in prop::collection::vec((0u8..20, 0u8..5), 0..40),
            limit in 1usize..50,
        ) {
            let input: Vec<ScoredCandidate> = pool
                .iter()
                .map(|(id, step)| scored(&format!("p{id:02}"), f32::from(*step) * 0.25))
                .collect();
            let best = input.iter().map(|s| s.score).fold(f32::MIN, f32::max);

            let ranked = rank(input, limit);

            prop_assert_eq!(ranked.len(), limit.min(pool.len()));
            if let Some(first) = ranked.first() {
                prop_assert_eq!(first.score, best);
            }
            for pair in ranked.windows(2) {
                let ordered = pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].entity_id <= pair[1].entity_id);
                prop_assert!(ordered, "{:?} before {:?}", pair[0], pair[1]);
            }
        }
    }
}
