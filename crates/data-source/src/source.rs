//! The data source collaborator.
//!
//! [`DataSource`] is the only way the recommendation and search components
//! reach stored data. It is deliberately narrow so a hosted backend can sit
//! behind it; [`InMemoryDataSource`] serves a loaded [`Catalog`] and keeps
//! feedback in memory.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::types::{
    CandidateScope, CatalogEntity, EntityKind, FeedbackEvent, FeedbackUpsert, UserId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, instrument};

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Up to `limit` entities in `scope`, ranked by popularity.
    ///
    /// When `query` is present, entities matching any of its whitespace
    /// separated tokens come first.
    async fn candidates(
        &self,
        scope: CandidateScope,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CatalogEntity>>;

    async fn entity(&self, id: &str) -> Result<Option<CatalogEntity>>;

    /// Every name suggestions may be drawn from
    async fn searchable_names(&self) -> Result<Vec<String>>;

    async fn politicians(&self) -> Result<Vec<CatalogEntity>>;

    /// Record feedback, idempotent per `(user_id, recommendation_id)`.
    ///
    /// History is append-only: a different reaction is appended, a repeat
    /// of the latest reaction is not.
    async fn upsert_feedback(&self, event: FeedbackEvent) -> Result<FeedbackUpsert>;

    /// All feedback a user has given, oldest first
    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<FeedbackEvent>>;
}

type FeedbackKey = (UserId, String);

/// Catalog-backed data source with in-memory feedback storage.
#[derive(Debug, Clone)]
pub struct InMemoryDataSource {
    catalog: Arc<Catalog>,
    feedback: Arc<DashMap<FeedbackKey, Vec<FeedbackEvent>>>,
}

impl InMemoryDataSource {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            feedback: Arc::new(DashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[async_trait]
impl DataSource for InMemoryDataSource {
    #[instrument(skip(self), level = "debug")]
    async fn candidates(
        &self,
        scope: CandidateScope,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CatalogEntity>> {
        let ranked = self
            .catalog
            .ranked_ids(scope)
            .iter()
            .filter_map(|id| self.catalog.get(id));

        let tokens: Vec<&str> = query.map(|q| q.split_whitespace().collect()).unwrap_or_default();
        if tokens.is_empty() {
            return Ok(ranked.take(limit).cloned().collect());
        }

        // Stable partition keeps the popularity order inside each group
        let (matching, rest): (Vec<&CatalogEntity>, Vec<&CatalogEntity>) =
            ranked.partition(|e| tokens.iter().any(|t| e.matches_token(t)));
        debug!("{} of the {:?} catalog match the query", matching.len(), scope);

        Ok(matching
            .into_iter()
            .chain(rest)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn entity(&self, id: &str) -> Result<Option<CatalogEntity>> {
        Ok(self.catalog.get(id).cloned())
    }

    async fn searchable_names(&self) -> Result<Vec<String>> {
        Ok(self.catalog.names().to_vec())
    }

    async fn politicians(&self) -> Result<Vec<CatalogEntity>> {
        Ok(self
            .catalog
            .ids_of_kind(EntityKind::Politician)
            .iter()
            .filter_map(|id| self.catalog.get(id).cloned())
            .collect())
    }

    async fn upsert_feedback(&self, event: FeedbackEvent) -> Result<FeedbackUpsert> {
        let key = (event.user_id.clone(), event.recommendation_id.clone());
        let outcome = match self.feedback.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(vec![event]);
                FeedbackUpsert::Inserted
            }
            Entry::Occupied(mut slot) => {
                let history = slot.get_mut();
                match history.last() {
                    Some(latest) if latest.feedback == event.feedback => FeedbackUpsert::Unchanged {
                        recorded: latest.clone(),
                    },
                    Some(latest) => {
                        let previous = latest.feedback;
                        history.push(event);
                        FeedbackUpsert::Changed { previous }
                    }
                    None => {
                        history.push(event);
                        FeedbackUpsert::Inserted
                    }
                }
            }
        };
        Ok(outcome)
    }

    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<FeedbackEvent>> {
        let mut events: Vec<FeedbackEvent> = self
            .feedback
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .flat_map(|entry| entry.value().clone())
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedbackKind;
    use chrono::{Duration, Utc};

    fn source() -> InMemoryDataSource {
        let catalog = Catalog::from_entities(vec![
            CatalogEntity::new("p1", EntityKind::Politician, "Alice Park")
                .with_popularity(0.4)
                .with_tags(["climate"]),
            CatalogEntity::new("p2", EntityKind::Politician, "Bob Stone").with_popularity(0.9),
            CatalogEntity::new("c1", EntityKind::Content, "Climate bill explained")
                .with_popularity(0.7),
        ])
        .unwrap();
        InMemoryDataSource::new(Arc::new(catalog))
    }

    fn event(kind: FeedbackKind, minutes: i64) -> FeedbackEvent {
        FeedbackEvent {
            user_id: "u1".to_string(),
            recommendation_id: "p1".to_string(),
            feedback: kind,
            timestamp: Utc::now() + Duration::minutes(minutes),
        }
    }

    fn ids(entities: &[CatalogEntity]) -> Vec<&str> {
        entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_candidates_by_scope() {
        let source = source();

        let all = source.candidates(CandidateScope::All, None, 10).await.unwrap();
        assert_eq!(ids(&all), ["p2", "c1", "p1"]);

        let politicians = source
            .candidates(CandidateScope::Politicians, None, 1)
            .await
            .unwrap();
        assert_eq!(ids(&politicians), ["p2"]);
    }

    #[tokio::test]
    async fn test_query_matches_come_first() {
        let source = source();

        let results = source
            .candidates(CandidateScope::All, Some("climate"), 10)
            .await
            .unwrap();
        assert_eq!(ids(&results), ["c1", "p1", "p2"]);
    }

    #[tokio::test]
    async fn test_feedback_upsert_is_idempotent_per_key() {
        let source = source();

        let original = event(FeedbackKind::Like, 0);
        let first = source.upsert_feedback(original.clone()).await.unwrap();
        assert_eq!(first, FeedbackUpsert::Inserted);

        // A repeat reports the original event, not the new timestamp
        let repeat = source.upsert_feedback(event(FeedbackKind::Like, 1)).await.unwrap();
        assert_eq!(repeat, FeedbackUpsert::Unchanged { recorded: original });

        let changed = source
            .upsert_feedback(event(FeedbackKind::Dislike, 2))
            .await
            .unwrap();
        assert_eq!(
            changed,
            FeedbackUpsert::Changed {
                previous: FeedbackKind::Like
            }
        );

        // History keeps both distinct reactions, oldest first
        let history = source.feedback_for_user("u1").await.unwrap();
        let kinds: Vec<FeedbackKind> = history.iter().map(|e| e.feedback).collect();
        assert_eq!(kinds, [FeedbackKind::Like, FeedbackKind::Dislike]);
        assert!(source.feedback_for_user("u2").await.unwrap().is_empty());
    }
}
