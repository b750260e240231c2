//! Filter to remove entities the caller explicitly excluded.
//!
//! This runs before scoring, as there's no point scoring candidates
//! that can never be returned.

use crate::context::ScoringContext;
use crate::traits::Filter;
use resilience::Result;
use sources::Candidate;

/// Removes candidates whose id is in the request's exclude set.
///
/// ## Algorithm
/// Uses the BTreeSet in ScoringContext.exclude_ids for O(log n) lookups.
pub struct ExcludedIdsFilter;

impl Filter for ExcludedIdsFilter {
    fn name(&self) -> &str {
        "ExcludedIdsFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &ScoringContext) -> Result<Vec<Candidate>> {
        if context.exclude_ids.is_empty() {
            return Ok(candidates);
        }
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.exclude_ids.contains(candidate.id()))
            .collect();
        Ok(filtered)
    }
}
