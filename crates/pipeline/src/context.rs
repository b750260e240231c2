//! Per-request state shared by filters and signals.

use chrono::{DateTime, Utc};
use data_source::{CatalogEntity, EntityId, UserId};
use sources::{RecommendationContext, RecommendationRequest};
use std::collections::BTreeSet;

/// Everything a filter or signal may look at besides the candidate itself.
///
/// Built once per ranking pass. `now` is captured up front so every
/// candidate is scored against the same instant.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub user_id: UserId,
    pub request_context: RecommendationContext,
    pub exclude_ids: BTreeSet<EntityId>,
    /// The entity the user is currently viewing, if it could be resolved
    pub current_entity: Option<CatalogEntity>,
    pub now: DateTime<Utc>,
}

impl ScoringContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            request_context: RecommendationContext::default(),
            exclude_ids: BTreeSet::new(),
            current_entity: None,
            now: Utc::now(),
        }
    }

    pub fn for_request(
        request: &RecommendationRequest,
        current_entity: Option<CatalogEntity>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: request.user_id.clone(),
            request_context: request.context.clone(),
            exclude_ids: request.exclude_ids.clone(),
            current_entity,
            now,
        }
    }

    /// Id of the entity being viewed, as requested (resolved or not)
    pub fn current_entity_id(&self) -> Option<&str> {
        self.request_context.current_entity_id.as_deref()
    }
}
