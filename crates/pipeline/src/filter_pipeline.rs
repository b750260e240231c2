//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::context::ScoringContext;
use crate::traits::Filter;
use resilience::Result;
use sources::Candidate;
use tracing::debug;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(ExcludedIdsFilter)
///     .add_filter(CurrentEntityFilter);
///
/// let filtered = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The pipeline every recommendation request runs through.
    pub fn standard() -> Self {
        Self::new()
            .add_filter(crate::filters::ExcludedIdsFilter)
            .add_filter(crate::filters::CurrentEntityFilter)
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Apply all filters in sequence, stopping at the first failure.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &ScoringContext) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current, context)?;
            debug!(
                "Filter {} kept {} of {} candidates",
                filter.name(),
                current.len(),
                before
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ExcludedIdsFilter;
    use crate::test_support::candidate;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = ScoringContext::new("u1");

        let candidates = vec![candidate("p1", 0.9), candidate("p2", 0.8)];

        let filtered = pipeline.apply(candidates, &context).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_filter() {
        let mut context = ScoringContext::new("u1");
        context.exclude_ids.insert("p1".to_string());

        let pipeline = FilterPipeline::new().add_filter(ExcludedIdsFilter);

        let candidates = vec![candidate("p1", 0.9), candidate("p2", 0.8)];

        let filtered = pipeline.apply(candidates, &context).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id(), "p2");
    }

    #[test]
    fn test_standard_pipeline_drops_excluded_and_current() {
        let mut context = ScoringContext::new("u1");
        context.exclude_ids.insert("p3".to_string());
        context.request_context.current_entity_id = Some("p1".to_string());

        let candidates = vec![candidate("p1", 0.9), candidate("p2", 0.9), candidate("p3", 0.95)];

        let filtered = FilterPipeline::standard().apply(candidates, &context).unwrap();
        let ids: Vec<&str> = filtered.iter().map(|c| c.id()).collect();
        assert_eq!(ids, ["p2"]);
    }
}
