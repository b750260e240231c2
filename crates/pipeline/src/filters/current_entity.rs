//! Filter to drop the entity the user is currently looking at.

use crate::context::ScoringContext;
use crate::traits::Filter;
use resilience::Result;
use sources::Candidate;

/// Removes the candidate matching `current_entity_id`, if any.
pub struct CurrentEntityFilter;

impl Filter for CurrentEntityFilter {
    fn name(&self) -> &str {
        "CurrentEntityFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &ScoringContext) -> Result<Vec<Candidate>> {
        let Some(current) = context.current_entity_id() else {
            return Ok(candidates);
        };
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.id() != current)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candidate;

    #[test]
    fn test_current_entity_removed() {
        let mut context = ScoringContext::new("u1");
        context.request_context.current_entity_id = Some("p2".to_string());

        let filtered = CurrentEntityFilter
            .apply(vec![candidate("p1", 0.5), candidate("p2", 0.5)], &context)
            .unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id(), "p1");
    }
}
