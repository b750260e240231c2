//! Topical relevance signal.

use crate::context::ScoringContext;
use crate::scorer::SignalTag;
use crate::traits::Signal;
use data_source::CatalogEntity;
use sources::Candidate;
use std::collections::HashSet;

const PARTY_WEIGHT: f32 = 0.4;
const CONSTITUENCY_WEIGHT: f32 = 0.3;
const POSITION_WEIGHT: f32 = 0.1;
const TAG_WEIGHT: f32 = 0.2;

/// Scores how closely a candidate matches what the user is looking at or
/// searching for.
///
/// Two independent measures, the larger wins:
/// - attribute similarity with the current entity (shared party,
///   constituency, position, and tag overlap)
/// - the fraction of search query tokens found in the candidate's name or tags
///
/// Unavailable when the request carries neither a resolved current entity
/// nor a search query.
pub struct RelevanceSignal;

impl RelevanceSignal {
    pub fn attribute_similarity(candidate: &CatalogEntity, current: &CatalogEntity) -> f32 {
        let shared = candidate.shared_attributes(current);
        let mut score = 0.0;
        if shared.party {
            score += PARTY_WEIGHT;
        }
        if shared.constituency {
            score += CONSTITUENCY_WEIGHT;
        }
        if shared.position {
            score += POSITION_WEIGHT;
        }
        score + TAG_WEIGHT * tag_jaccard(&candidate.tags, &current.tags)
    }

    pub fn query_match(candidate: &CatalogEntity, query: &str) -> Option<f32> {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        let matched = tokens.iter().filter(|t| candidate.matches_token(t)).count();
        Some(matched as f32 / tokens.len() as f32)
    }
}

fn tag_jaccard(a: &[String], b: &[String]) -> f32 {
    let a: HashSet<String> = a.iter().map(|t| t.to_lowercase()).collect();
    let b: HashSet<String> = b.iter().map(|t| t.to_lowercase()).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f32 / union as f32
}

impl Signal for RelevanceSignal {
    fn tag(&self) -> SignalTag {
        SignalTag::TopicalRelevance
    }

    fn evaluate(&self, candidate: &Candidate, context: &ScoringContext) -> Option<f32> {
        let by_entity = context
            .current_entity
            .as_ref()
            .map(|current| Self::attribute_similarity(&candidate.entity, current));
        let by_query = context
            .request_context
            .search_query
            .as_deref()
            .and_then(|q| Self::query_match(&candidate.entity, q));

        match (by_entity, by_query) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candidate;
    use data_source::EntityKind;

    fn senator(id: &str, party: &str, constituency: &str) -> CatalogEntity {
        CatalogEntity::new(id, EntityKind::Politician, id)
            .with_party(party)
            .with_constituency(constituency)
            .with_position("Senator")
    }

    #[test]
    fn test_attribute_similarity() {
        let current = senator("p1", "Green", "North").with_tags(["climate", "transit"]);
        let same = senator("p2", "green", "North").with_tags(["climate", "transit"]);
        let other = CatalogEntity::new("p3", EntityKind::Politician, "p3");

        assert!((RelevanceSignal::attribute_similarity(&same, &current) - 1.0).abs() < 1e-6);
        assert_eq!(RelevanceSignal::attribute_similarity(&other, &current), 0.0);
    }

    #[test]
    fn test_query_match_fraction() {
        let entity = CatalogEntity::new("c1", EntityKind::Content, "Housing Policy Explained")
            .with_tags(["budget"]);

        assert_eq!(RelevanceSignal::query_match(&entity, "housing budget"), Some(1.0));
        assert_eq!(RelevanceSignal::query_match(&entity, "housing taxes"), Some(0.5));
        assert_eq!(RelevanceSignal::query_match(&entity, "   "), None);
    }

    #[test]
    fn test_unavailable_without_entity_or_query() {
        let context = ScoringContext::new("u1");
        assert_eq!(RelevanceSignal.evaluate(&candidate("p1", 0.5), &context), None);
    }

    #[test]
    fn test_takes_stronger_measure() {
        let mut context = ScoringContext::new("u1");
        context.current_entity = Some(senator("p1", "Green", "North"));
        context.request_context.search_query = Some("p2".to_string());

        let mut c = candidate("p2", 0.5);
        c.entity.party = Some("Green".to_string());

        // Name matches the single query token fully, beating the party overlap
        assert_eq!(RelevanceSignal.evaluate(&c, &context), Some(1.0));
    }
}
