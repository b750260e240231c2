//! Core domain types for the politician directory catalog.
//!
//! Everything the recommendation and search components read from the data
//! source is expressed with these types: catalog entities (politicians and
//! content items), geographic points and feedback events.

use chrono::{DateTime, Utc};
use resilience::ClassifiedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque identifier of an application user
pub type UserId = String;

/// Identifier of a politician or content item in the catalog
pub type EntityId = String;

// =============================================================================
// Catalog Types
// =============================================================================

/// What a catalog entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Politician,
    Content,
}

/// Which part of the catalog a candidate query draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateScope {
    Politicians,
    Content,
    All,
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * Self::EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// A politician or content item that can be recommended.
///
/// Attribute fields are optional: a content item has no party, a
/// politician may have no known location. Missing means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub constituency: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Last time the entity's profile or content changed
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Baseline popularity in [0, 1]; the candidate's base score
    #[serde(default)]
    pub popularity: f32,
}

impl CatalogEntity {
    /// Minimal entity with only the required fields set.
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            party: None,
            constituency: None,
            position: None,
            tags: Vec::new(),
            location: None,
            updated_at: None,
            popularity: 0.0,
        }
    }

    pub fn with_popularity(mut self, popularity: f32) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        self.party = Some(party.into());
        self
    }

    pub fn with_constituency(mut self, constituency: impl Into<String>) -> Self {
        self.constituency = Some(constituency.into());
        self
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Case-insensitive check against the name and tags.
    pub fn matches_token(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.name.to_lowercase().contains(&token)
            || self.tags.iter().any(|tag| tag.to_lowercase() == token)
    }

    /// Which descriptive attributes both entities have and agree on.
    pub fn shared_attributes(&self, other: &CatalogEntity) -> SharedAttributes {
        SharedAttributes {
            party: same_value(&self.party, &other.party),
            constituency: same_value(&self.constituency, &other.constituency),
            position: same_value(&self.position, &other.position),
        }
    }
}

/// Attribute agreement between two entities. Unknown never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SharedAttributes {
    pub party: bool,
    pub constituency: bool,
    pub position: bool,
}

fn same_value(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

// =============================================================================
// Feedback Types
// =============================================================================

/// Explicit or implicit reaction to a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Like,
    Dislike,
    NotInterested,
    Clicked,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
            FeedbackKind::NotInterested => "not_interested",
            FeedbackKind::Clicked => "clicked",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackKind {
    type Err = ClassifiedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(FeedbackKind::Like),
            "dislike" => Ok(FeedbackKind::Dislike),
            "not_interested" => Ok(FeedbackKind::NotInterested),
            "clicked" => Ok(FeedbackKind::Clicked),
            other => Err(ClassifiedError::validation(format!(
                "Invalid feedback '{other}', expected one of: like, dislike, not_interested, clicked"
            ))),
        }
    }
}

/// A single recorded reaction. Durable and owned by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub user_id: UserId,
    pub recommendation_id: String,
    pub feedback: FeedbackKind,
    pub timestamp: DateTime<Utc>,
}

/// What an idempotent feedback upsert did.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackUpsert {
    /// First feedback for this (user, recommendation) key
    Inserted,
    /// Feedback differs from the latest recorded value
    Changed { previous: FeedbackKind },
    /// Same feedback as the latest recorded value; nothing appended.
    /// Carries the event already on record.
    Unchanged { recorded: FeedbackEvent },
}
