//! # Recommendation Engine
//!
//! Coordinates the recommendation pipeline for one request:
//! 1. Validate the request (before any retry)
//! 2. Resolve the entity being viewed, if any
//! 3. Fetch an over-sized candidate pool from the data source
//! 4. Apply filters
//! 5. Score with weighted signals (rayon fan-out)
//! 6. Rank and truncate
//!
//! Steps 2-6 run inside the `standard` retry preset, so a transient data
//! source failure restarts the pass rather than failing the request.
//!
//! It also records feedback and keeps the per-user affinity model in step
//! with it. The model lives in memory while feedback is durable, so each
//! user's history is replayed into the model the first time this engine
//! sees them.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashSet;
use tracing::{debug, info, instrument};

use crate::config::{EngineSettings, RetryPresets};
use data_source::{DataSource, FeedbackEvent, FeedbackKind, FeedbackUpsert, UserId};
use pipeline::{
    feedback_delta, rank, AffinityModel, FilterPipeline, RecommendationResult, Scorer, ScoringContext,
};
use resilience::{CancellationToken, ClassifiedError, Result, RetryExecutor};
use sources::{CatalogSource, RecommendationRequest};

/// Produces recommendations and absorbs feedback.
#[derive(Clone)]
pub struct RecommendationEngine {
    data_source: Arc<dyn DataSource>,
    catalog_source: CatalogSource,
    filter_pipeline: Arc<FilterPipeline>,
    scorer: Arc<Scorer>,
    affinity: Arc<AffinityModel>,
    /// Users whose feedback history has been replayed into `affinity`
    loaded_users: Arc<DashSet<UserId>>,
    settings: EngineSettings,
    retry: RetryPresets,
}

impl RecommendationEngine {
    /// Create an engine with the standard filters and signal set.
    pub fn new(data_source: Arc<dyn DataSource>, settings: EngineSettings, retry: RetryPresets) -> Self {
        let affinity = Arc::new(AffinityModel::new());
        let catalog_source =
            CatalogSource::new(data_source.clone()).with_over_fetch_multiplier(settings.candidate_multiplier);
        let scorer = Scorer::standard(settings.weights, settings.recency_half_life_days, affinity.clone());

        Self {
            data_source,
            catalog_source,
            filter_pipeline: Arc::new(FilterPipeline::standard()),
            scorer: Arc::new(scorer),
            affinity,
            loaded_users: Arc::new(DashSet::new()),
            settings,
            retry,
        }
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    pub fn affinity(&self) -> &Arc<AffinityModel> {
        &self.affinity
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn retry_presets(&self) -> &RetryPresets {
        &self.retry
    }

    /// Clamp a requested limit into `1..=max_limit`.
    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.settings.max_limit)
    }

    /// Main entry point: ranked recommendations for `request`.
    ///
    /// # Returns
    /// At most `limit` entries, sorted by score (highest first, ties by id),
    /// never containing an excluded id or the entity being viewed.
    #[instrument(skip_all, fields(user_id = %request.user_id, kind = ?request.kind))]
    pub async fn generate_recommendations(
        &self,
        request: &RecommendationRequest,
        cancel: &CancellationToken,
    ) -> Result<RecommendationResult> {
        let start_time = Instant::now();

        let mut request = request.clone();
        request.context = request.context.normalized();
        request.validate()?;
        request.limit = self.clamp_limit(request.limit);
        self.ensure_affinity_loaded(&request.user_id, cancel).await?;

        let request = &request;
        let recommendations = RetryExecutor::new()
            .with_cancellation(cancel.clone())
            .execute("generate_recommendations", &self.retry.standard, move || {
                self.rank_once(request)
            })
            .await?;

        info!(
            "Selected {} recommendations for user {} in {:.2?}",
            recommendations.len(),
            request.user_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// One full pass: resolve, fetch, filter, score, rank.
    async fn rank_once(&self, request: &RecommendationRequest) -> Result<RecommendationResult> {
        let current_entity = match request.context.current_entity_id.as_deref() {
            Some(id) => self.data_source.entity(id).await?,
            None => None,
        };

        let candidates = self.catalog_source.get_candidates(request, request.limit).await?;
        let context = ScoringContext::for_request(request, current_entity, Utc::now());

        let filtered = self.filter_pipeline.apply(candidates, &context)?;
        debug!("Filtering complete, {} candidates remain", filtered.len());

        let scored = self.scorer.score(filtered, &context);
        Ok(rank(scored, request.limit))
    }

    /// Record a feedback event and nudge the user's affinity for the entity.
    ///
    /// The recommendation id must name a catalog entity (NOT_FOUND otherwise).
    /// Repeating the feedback already on record is accepted but does not
    /// move the affinity again; the event returned is then the one on record.
    #[instrument(skip(self, cancel))]
    pub async fn update_recommendation_models(
        &self,
        user_id: &str,
        recommendation_id: &str,
        feedback: &str,
        cancel: &CancellationToken,
    ) -> Result<FeedbackEvent> {
        let user_id = user_id.trim();
        let recommendation_id = recommendation_id.trim();
        if user_id.is_empty() {
            return Err(ClassifiedError::validation("userId is required"));
        }
        if recommendation_id.is_empty() {
            return Err(ClassifiedError::validation("recommendationId is required"));
        }
        let kind: FeedbackKind = feedback.trim().parse()?;

        let event = FeedbackEvent {
            user_id: user_id.to_string(),
            recommendation_id: recommendation_id.to_string(),
            feedback: kind,
            timestamp: Utc::now(),
        };

        // Replay history first so this event is not counted twice
        self.ensure_affinity_loaded(user_id, cancel).await?;

        let record = &event;
        let outcome = RetryExecutor::new()
            .with_cancellation(cancel.clone())
            .execute("record_feedback", &self.retry.standard, move || {
                self.record_feedback(record)
            })
            .await?;

        match outcome {
            FeedbackUpsert::Unchanged { recorded } => {
                debug!("Feedback {} already recorded for {}", kind, recommendation_id);
                Ok(recorded)
            }
            FeedbackUpsert::Inserted | FeedbackUpsert::Changed { .. } => {
                let affinity = self.affinity.nudge(user_id, recommendation_id, feedback_delta(kind));
                debug!("Affinity for {} on {} is now {:.2}", user_id, recommendation_id, affinity);
                Ok(event)
            }
        }
    }

    /// Persist `event` if it names a catalog entity.
    async fn record_feedback(&self, event: &FeedbackEvent) -> Result<FeedbackUpsert> {
        if self.data_source.entity(&event.recommendation_id).await?.is_none() {
            return Err(ClassifiedError::not_found(format!(
                "Recommendation {} not found",
                event.recommendation_id
            )));
        }
        Ok(self.data_source.upsert_feedback(event.clone()).await?)
    }

    /// Replay stored feedback the first time a user reaches this engine.
    async fn ensure_affinity_loaded(&self, user_id: &str, cancel: &CancellationToken) -> Result<()> {
        if self.loaded_users.contains(user_id.trim()) {
            return Ok(());
        }
        let replayed = self.rebuild_affinity(user_id, cancel).await?;
        debug!("Loaded {} feedback events for {}", replayed, user_id);
        Ok(())
    }

    /// Replay a user's stored feedback history into the affinity model.
    ///
    /// # Returns
    /// Number of events replayed
    #[instrument(skip(self, cancel))]
    pub async fn rebuild_affinity(&self, user_id: &str, cancel: &CancellationToken) -> Result<usize> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ClassifiedError::validation("userId is required"));
        }

        let ds = &self.data_source;
        let events = RetryExecutor::new()
            .with_cancellation(cancel.clone())
            .execute("load_feedback_history", &self.retry.standard, move || async move {
                ds.feedback_for_user(user_id).await.map_err(ClassifiedError::from)
            })
            .await?;

        self.affinity.rebuild_user(user_id, &events);
        self.loaded_users.insert(user_id.to_string());
        Ok(events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use data_source::{
        CandidateScope, Catalog, CatalogEntity, DataSourceError, EntityKind, InMemoryDataSource,
    };
    use resilience::ErrorKind;
    use sources::{RecommendationContext, RecommendationType};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn catalog() -> Catalog {
        Catalog::from_entities(vec![
            CatalogEntity::new("p1", EntityKind::Politician, "Ada Park")
                .with_popularity(0.9)
                .with_party("Green"),
            CatalogEntity::new("p2", EntityKind::Politician, "Ben Cho")
                .with_popularity(0.9)
                .with_party("Blue"),
            CatalogEntity::new("p3", EntityKind::Politician, "Cy Dunn")
                .with_popularity(0.95)
                .with_party("Green"),
            CatalogEntity::new("c1", EntityKind::Content, "Housing explainer").with_popularity(0.99),
        ])
        .unwrap()
    }

    fn engine_over(source: Arc<dyn DataSource>) -> RecommendationEngine {
        RecommendationEngine::new(source, EngineSettings::default(), RetryPresets::default())
    }

    fn engine() -> RecommendationEngine {
        engine_over(Arc::new(InMemoryDataSource::new(Arc::new(catalog()))))
    }

    fn ids(result: &RecommendationResult) -> Vec<&str> {
        result.iter().map(|r| r.entity_id.as_str()).collect()
    }

    /// Fails every data-source call until `failures` calls have been made.
    struct FlakySource {
        inner: InMemoryDataSource,
        calls: AtomicU32,
        failures: u32,
    }

    impl FlakySource {
        fn new(failures: u32) -> Self {
            Self {
                inner: InMemoryDataSource::new(Arc::new(catalog())),
                calls: AtomicU32::new(0),
                failures,
            }
        }

        fn tick(&self) -> data_source::Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                return Err(DataSourceError::Timeout(format!("call {n}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DataSource for FlakySource {
        async fn candidates(
            &self,
            scope: CandidateScope,
            query: Option<&str>,
            limit: usize,
        ) -> data_source::Result<Vec<CatalogEntity>> {
            self.tick()?;
            self.inner.candidates(scope, query, limit).await
        }

        async fn entity(&self, id: &str) -> data_source::Result<Option<CatalogEntity>> {
            self.tick()?;
            self.inner.entity(id).await
        }

        async fn searchable_names(&self) -> data_source::Result<Vec<String>> {
            self.tick()?;
            self.inner.searchable_names().await
        }

        async fn politicians(&self) -> data_source::Result<Vec<CatalogEntity>> {
            self.tick()?;
            self.inner.politicians().await
        }

        async fn upsert_feedback(&self, event: FeedbackEvent) -> data_source::Result<FeedbackUpsert> {
            self.tick()?;
            self.inner.upsert_feedback(event).await
        }

        async fn feedback_for_user(&self, user_id: &str) -> data_source::Result<Vec<FeedbackEvent>> {
            self.tick()?;
            self.inner.feedback_for_user(user_id).await
        }
    }

    #[tokio::test]
    async fn test_excluded_top_candidate_skipped() {
        let request = RecommendationRequest::new("u1", RecommendationType::Politician)
            .with_limit(2)
            .with_excluded(["p3"]);

        let result = engine()
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), ["p1", "p2"]);
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_content_scope_and_limit_clamp() {
        let engine = engine();
        let request = RecommendationRequest::new("u1", RecommendationType::Content).with_limit(0);

        let result = engine
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ids(&result), ["c1"]);
        assert_eq!(engine.clamp_limit(500), 50);
    }

    #[tokio::test]
    async fn test_viewed_politician_excluded_and_party_peer_boosted() {
        let request = RecommendationRequest::new("u1", RecommendationType::Politician).with_context(
            RecommendationContext {
                current_entity_id: Some("p3".to_string()),
                ..RecommendationContext::default()
            },
        );

        let result = engine()
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), ["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_blank_user_id_is_validation_error_without_calls() {
        let source = Arc::new(FlakySource::new(0));
        let engine = engine_over(source.clone());
        let request = RecommendationRequest::new("   ", RecommendationType::Politician);

        let err = engine
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_absorbed_on_third_attempt() {
        let source = Arc::new(FlakySource::new(2));
        let engine = engine_over(source.clone());
        let request = RecommendationRequest::new("u1", RecommendationType::Politician).with_limit(1);

        let result = engine
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&result), ["p3"]);
        // Three history loads (two failures) then one candidate fetch
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);

        // The history is loaded once per user
        engine
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_surface_after_exhaustion() {
        let source = Arc::new(FlakySource::new(u32::MAX));
        let engine = engine_over(source.clone());
        let request = RecommendationRequest::new("u1", RecommendationType::Politician);

        let err = engine
            .generate_recommendations(&request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransientBackend);
        assert_eq!(err.http_status(), 500);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_feedback_rejected_before_persisting() {
        let source = Arc::new(FlakySource::new(0));
        let engine = engine_over(source.clone());

        let err = engine
            .update_recommendation_models("u1", "p1", "invalid", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = engine
            .update_recommendation_models("u1", " ", "like", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_like_feedback_lifts_entity() {
        let engine = engine();
        let cancel = CancellationToken::new();
        let request = RecommendationRequest::new("u1", RecommendationType::Politician);

        let before = engine.generate_recommendations(&request, &cancel).await.unwrap();
        let rank_before = ids(&before).iter().position(|id| *id == "p2").unwrap();

        let event = engine
            .update_recommendation_models("u1", "p2", "like", &cancel)
            .await
            .unwrap();
        assert_eq!(event.feedback, FeedbackKind::Like);

        let after = engine.generate_recommendations(&request, &cancel).await.unwrap();
        let rank_after = ids(&after).iter().position(|id| *id == "p2").unwrap();

        assert!(rank_after <= rank_before);
        assert_eq!(ids(&after)[0], "p2");
    }

    #[tokio::test]
    async fn test_repeat_feedback_nudges_once() {
        let engine = engine();
        let cancel = CancellationToken::new();

        engine.update_recommendation_models("u1", "p1", "like", &cancel).await.unwrap();
        engine.update_recommendation_models("u1", "p1", "like", &cancel).await.unwrap();
        assert_eq!(engine.affinity().get("u1", "p1"), Some(0.25));

        engine.update_recommendation_models("u1", "p1", "dislike", &cancel).await.unwrap();
        assert_eq!(engine.affinity().get("u1", "p1"), Some(0.0));
    }

    #[tokio::test]
    async fn test_rebuild_affinity_replays_history() {
        let source: Arc<dyn DataSource> = Arc::new(InMemoryDataSource::new(Arc::new(catalog())));
        let cancel = CancellationToken::new();

        let first = engine_over(source.clone());
        first.update_recommendation_models("u1", "p1", "like", &cancel).await.unwrap();
        first.update_recommendation_models("u1", "p2", "clicked", &cancel).await.unwrap();

        let restarted = engine_over(source);
        assert!(restarted.affinity().is_empty());

        let replayed = restarted.rebuild_affinity("u1", &cancel).await.unwrap();
        assert_eq!(replayed, 2);
        assert_eq!(restarted.affinity().get("u1", "p1"), Some(0.25));
        assert_eq!(restarted.affinity().get("u1", "p2"), Some(0.1));
    }

    #[tokio::test]
    async fn test_restarted_engine_relearns_affinity_lazily() {
        let source: Arc<dyn DataSource> = Arc::new(InMemoryDataSource::new(Arc::new(catalog())));
        let cancel = CancellationToken::new();
        let request = RecommendationRequest::new("u1", RecommendationType::Politician);

        let first = engine_over(source.clone());
        let original = first.update_recommendation_models("u1", "p2", "like", &cancel).await.unwrap();
        let result = first.generate_recommendations(&request, &cancel).await.unwrap();
        assert_eq!(ids(&result)[0], "p2");

        // Same data source, fresh in-memory model
        let restarted = engine_over(source);
        let result = restarted.generate_recommendations(&request, &cancel).await.unwrap();
        assert_eq!(ids(&result)[0], "p2");
        assert_eq!(restarted.affinity().get("u1", "p2"), Some(0.25));

        // Repeating the like neither nudges again nor restamps the event
        let repeat = restarted
            .update_recommendation_models("u1", "p2", "like", &cancel)
            .await
            .unwrap();
        assert_eq!(repeat, original);
        assert_eq!(restarted.affinity().get("u1", "p2"), Some(0.25));
    }

    #[tokio::test]
    async fn test_repeat_feedback_after_restart_without_recommendations() {
        let source: Arc<dyn DataSource> = Arc::new(InMemoryDataSource::new(Arc::new(catalog())));
        let cancel = CancellationToken::new();

        engine_over(source.clone())
            .update_recommendation_models("u1", "p1", "like", &cancel)
            .await
            .unwrap();

        let restarted = engine_over(source);
        restarted.update_recommendation_models("u1", "p1", "like", &cancel).await.unwrap();
        assert_eq!(restarted.affinity().get("u1", "p1"), Some(0.25));
    }

    #[tokio::test]
    async fn test_feedback_on_unknown_entity_is_not_found() {
        let source: Arc<dyn DataSource> = Arc::new(InMemoryDataSource::new(Arc::new(catalog())));
        let engine = engine_over(source.clone());
        let cancel = CancellationToken::new();

        let err = engine
            .update_recommendation_models("u1", "p99", "like", &cancel)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(engine.affinity().is_empty());
        assert!(source.feedback_for_user("u1").await.unwrap().is_empty());
    }
}
