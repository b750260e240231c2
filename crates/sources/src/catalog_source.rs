//! Catalog Source - candidate resolution
//!
//! Pulls the unfiltered candidate set for a request from the data source.
//!
//! ## Algorithm
//! 1. Pick the catalog scope from the request type
//! 2. Over-fetch `multiplier x limit` entities, plus one per excluded id so
//!    exclusions cannot starve the final list
//! 3. For search requests, pass the search query so matching entities rank
//!    first in the pool
//! 4. Wrap every entity as a [`Candidate`] with its popularity as base score

use crate::types::{Candidate, RecommendationRequest, RecommendationType};
use data_source::DataSource;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resolves candidate pools from the data source
#[derive(Clone)]
pub struct CatalogSource {
    data_source: Arc<dyn DataSource>,

    /// How many multiples of the requested limit to fetch before filtering
    over_fetch_multiplier: usize,
}

impl CatalogSource {
    pub const DEFAULT_OVER_FETCH_MULTIPLIER: usize = 3;

    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self {
            data_source,
            over_fetch_multiplier: Self::DEFAULT_OVER_FETCH_MULTIPLIER,
        }
    }

    /// Configure the over-fetch multiplier (default: 3, minimum: 1)
    pub fn with_over_fetch_multiplier(mut self, multiplier: usize) -> Self {
        self.over_fetch_multiplier = multiplier.max(1);
        self
    }

    /// Number of entities requested from the data source for a given limit.
    pub fn pool_size(&self, limit: usize, excluded: usize) -> usize {
        limit
            .saturating_mul(self.over_fetch_multiplier)
            .saturating_add(excluded)
    }

    /// Fetch the candidate set for `request`, sized for `limit` results.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, kind = ?request.kind))]
    pub async fn get_candidates(
        &self,
        request: &RecommendationRequest,
        limit: usize,
    ) -> data_source::Result<Vec<Candidate>> {
        let pool_size = self.pool_size(limit, request.exclude_ids.len());
        let query = match request.kind {
            RecommendationType::Search => request.context.search_query.as_deref(),
            RecommendationType::Politician | RecommendationType::Content => None,
        };

        let entities = self
            .data_source
            .candidates(request.kind.scope(), query, pool_size)
            .await?;

        debug!(
            "Resolved {} candidates (pool size {})",
            entities.len(),
            pool_size
        );
        Ok(entities.into_iter().map(Candidate::new).collect())
    }
}
