//! Typeahead suggestions and related-politician lookup.

use crate::fuzzy::{bounded_levenshtein, threshold_for};
use crate::types::{clamp_limit, is_searchable, RelatedPolitician};
use data_source::{CatalogEntity, DataSource};
use resilience::{CancellationToken, ClassifiedError, ErrorKind, Result, RetryExecutor, RetryPolicy};
use serde_json::json;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

const PARTY_WEIGHT: f32 = 0.5;
const CONSTITUENCY_WEIGHT: f32 = 0.3;
const POSITION_WEIGHT: f32 = 0.2;

/// Search over the catalog's names and politician attributes.
#[derive(Clone)]
pub struct SearchService {
    data_source: Arc<dyn DataSource>,
    suggestion_policy: RetryPolicy,
    related_policy: RetryPolicy,
}

impl SearchService {
    /// Suggestions use the `fast_best_effort` preset, related lookups `standard`.
    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self {
            data_source,
            suggestion_policy: RetryPolicy::fast_best_effort(),
            related_policy: RetryPolicy::standard(),
        }
    }

    pub fn with_policies(mut self, suggestion: RetryPolicy, related: RetryPolicy) -> Self {
        self.suggestion_policy = suggestion;
        self.related_policy = related;
        self
    }

    /// Names matching `query`: prefix matches first, then near misses.
    ///
    /// Queries shorter than two characters (after trimming) return an empty
    /// list without touching the data source.
    #[instrument(skip(self, cancel))]
    pub async fn get_suggestions(
        &self,
        query: &str,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let limit = clamp_limit(limit);
        let needle = query.trim().to_lowercase();

        let ds = &self.data_source;
        let names = RetryExecutor::new()
            .with_cancellation(cancel.clone())
            .execute("search_suggestions", &self.suggestion_policy, || async move {
                ds.searchable_names().await.map_err(ClassifiedError::from)
            })
            .await?;

        let suggestions = match_names(names, &needle, limit);
        debug!("{} suggestions for {:?}", suggestions.len(), needle);
        Ok(suggestions)
    }

    /// Politicians sharing party, constituency or position with `entity_id`.
    #[instrument(skip(self, cancel))]
    pub async fn get_related_politicians(
        &self,
        entity_id: &str,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RelatedPolitician>> {
        let entity_id = entity_id.trim();
        if entity_id.is_empty() {
            return Err(ClassifiedError::validation("Politician ID is required"));
        }
        let limit = clamp_limit(limit);

        let ds = &self.data_source;
        let (source, pool) = RetryExecutor::new()
            .with_cancellation(cancel.clone())
            .execute("related_politicians", &self.related_policy, || async move {
                let source = ds.entity(entity_id).await?.ok_or_else(|| {
                    ClassifiedError::builder(
                        ErrorKind::NotFound,
                        format!("politician {entity_id} not found"),
                    )
                    .context(json!({ "politicianId": entity_id }))
                    .build()
                })?;
                let pool = ds.politicians().await?;
                Ok::<_, ClassifiedError>((source, pool))
            })
            .await?;

        let related = rank_related(&source, pool, limit);
        debug!("{} related politicians for {}", related.len(), entity_id);
        Ok(related)
    }
}

/// Prefix group then fuzzy group, each sorted by name and deduplicated.
fn match_names(names: Vec<String>, needle: &str, limit: usize) -> Vec<String> {
    let threshold = threshold_for(needle);
    let mut prefix = Vec::new();
    let mut fuzzy = Vec::new();

    for name in names {
        let lowered = name.to_lowercase();
        let mut words = lowered.split_whitespace();
        if lowered.starts_with(needle) || words.any(|w| w.starts_with(needle)) {
            prefix.push(name);
        } else if bounded_levenshtein(&lowered, needle, threshold).is_some()
            || lowered
                .split_whitespace()
                .any(|w| bounded_levenshtein(w, needle, threshold).is_some())
        {
            fuzzy.push(name);
        }
    }

    for group in [&mut prefix, &mut fuzzy] {
        group.sort();
        group.dedup();
    }

    prefix.into_iter().chain(fuzzy).take(limit).collect()
}

fn similarity(source: &CatalogEntity, other: &CatalogEntity) -> (f32, Vec<&'static str>) {
    let shared = source.shared_attributes(other);
    let mut score = 0.0;
    let mut names = Vec::new();
    if shared.party {
        score += PARTY_WEIGHT;
        names.push("party");
    }
    if shared.constituency {
        score += CONSTITUENCY_WEIGHT;
        names.push("constituency");
    }
    if shared.position {
        score += POSITION_WEIGHT;
        names.push("position");
    }
    (score, names)
}

fn rank_related(source: &CatalogEntity, pool: Vec<CatalogEntity>, limit: usize) -> Vec<RelatedPolitician> {
    let mut related: Vec<RelatedPolitician> = pool
        .into_iter()
        .filter(|candidate| candidate.id != source.id)
        .filter_map(|candidate| {
            let (similarity, shared_attributes) = similarity(source, &candidate);
            (similarity > 0.0).then_some(RelatedPolitician {
                entity: candidate,
                similarity,
                shared_attributes,
            })
        })
        .collect();

    related.sort_by(|a, b| match b.similarity.total_cmp(&a.similarity) {
        Ordering::Equal => a.entity.id.cmp(&b.entity.id),
        other => other,
    });
    related.truncate(limit);
    related
}
