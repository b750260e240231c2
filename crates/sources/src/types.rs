//! Request, context and candidate types shared by the recommendation stages.

use data_source::{CandidateScope, CatalogEntity, EntityId, GeoPoint, UserId};
use resilience::{ClassifiedError, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

/// What kind of recommendations the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    #[default]
    Politician,
    Content,
    Search,
}

impl RecommendationType {
    /// Catalog scope candidates are drawn from. Search spans everything.
    pub fn scope(&self) -> CandidateScope {
        match self {
            RecommendationType::Politician => CandidateScope::Politicians,
            RecommendationType::Content => CandidateScope::Content,
            RecommendationType::Search => CandidateScope::All,
        }
    }
}

impl std::str::FromStr for RecommendationType {
    type Err = ClassifiedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "politician" => Ok(RecommendationType::Politician),
            "content" => Ok(RecommendationType::Content),
            "search" => Ok(RecommendationType::Search),
            other => Err(ClassifiedError::validation(format!(
                "Invalid type '{other}', expected one of: politician, content, search"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

/// Contextual signals that accompany a request.
///
/// Every field is optional and `None` means the signal is unavailable,
/// which is different from a zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    #[serde(default, alias = "currentPoliticianId", skip_serializing_if = "Option::is_none")]
    pub current_entity_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
}

impl RecommendationContext {
    /// Blank strings carry no signal; turn them into `None`.
    pub fn normalized(mut self) -> Self {
        self.current_entity_id = non_blank(self.current_entity_id);
        self.search_query = non_blank(self.search_query);
        self
    }

    pub fn validate(&self) -> resilience::Result<()> {
        if let Some(location) = self.location {
            if !location.is_valid() {
                return Err(ClassifiedError::builder(
                    ErrorKind::Validation,
                    "location must have latitude in [-90, 90] and longitude in [-180, 180]",
                )
                .context(json!({
                    "latitude": location.latitude,
                    "longitude": location.longitude,
                }))
                .build());
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A typed recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub limit: usize,
    pub exclude_ids: BTreeSet<EntityId>,
    pub context: RecommendationContext,
}

impl RecommendationRequest {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(user_id: impl Into<UserId>, kind: RecommendationType) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            limit: Self::DEFAULT_LIMIT,
            exclude_ids: BTreeSet::new(),
            context: RecommendationContext::default(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_excluded<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityId>,
    {
        self.exclude_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_context(mut self, context: RecommendationContext) -> Self {
        self.context = context;
        self
    }

    /// Checks done at the public entry point, before any retry wrapping.
    pub fn validate(&self) -> resilience::Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ClassifiedError::validation("userId is required"));
        }
        self.context.validate()
    }
}

/// An entity under consideration for a recommendation list.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub entity: CatalogEntity,
    /// Baseline score before contextual signals; the entity's popularity
    pub base_score: f32,
}

impl Candidate {
    pub fn new(entity: CatalogEntity) -> Self {
        let base_score = entity.popularity;
        Self { entity, base_score }
    }

    pub fn id(&self) -> &str {
        &self.entity.id
    }
}
