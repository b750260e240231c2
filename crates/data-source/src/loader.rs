//! Loader for JSON catalog datasets.
//!
//! Dataset layout:
//! ```json
//! {
//!   "politicians": [{ "id": "p1", "name": "...", "party": "...", ... }],
//!   "content":     [{ "id": "c1", "name": "...", "tags": ["..."], ... }]
//! }
//! ```
//! The `kind` of every record is implied by the array it appears in.

use crate::catalog::Catalog;
use crate::error::{DataSourceError, Result};
use crate::types::{CatalogEntity, EntityKind, GeoPoint};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    politicians: Vec<EntityRecord>,
    #[serde(default)]
    content: Vec<EntityRecord>,
}

/// One record as it appears in the dataset file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityRecord {
    id: String,
    name: String,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    constituency: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    location: Option<GeoPoint>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    popularity: f32,
}

impl EntityRecord {
    fn into_entity(self, kind: EntityKind) -> CatalogEntity {
        CatalogEntity {
            id: self.id,
            kind,
            name: self.name,
            party: self.party,
            constituency: self.constituency,
            position: self.position,
            tags: self.tags,
            location: self.location,
            updated_at: self.updated_at,
            popularity: self.popularity,
        }
    }
}

impl Catalog {
    /// Load and validate a catalog from a JSON dataset file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DataSourceError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        let catalog = parse_dataset(&raw, &path.display().to_string())?;

        let (politicians, content) = catalog.counts();
        info!(
            "Loaded catalog from {}: {} politicians, {} content items",
            path.display(),
            politicians,
            content
        );
        Ok(catalog)
    }
}

/// Parse a dataset document. `origin` is only used in error messages.
pub fn parse_dataset(raw: &str, origin: &str) -> Result<Catalog> {
    let dataset: DatasetFile = serde_json::from_str(raw).map_err(|e| DataSourceError::Parse {
        file: origin.to_string(),
        reason: e.to_string(),
    })?;

    let politicians = dataset
        .politicians
        .into_iter()
        .map(|r| r.into_entity(EntityKind::Politician));
    let content = dataset
        .content
        .into_iter()
        .map(|r| r.into_entity(EntityKind::Content));

    Catalog::from_entities(politicians.chain(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset() {
        let raw = r#"{
            "politicians": [
                {"id": "p1", "name": "Alice Park", "party": "Green", "popularity": 0.8,
                 "location": {"latitude": 52.5, "longitude": 13.4},
                 "updatedAt": "2026-09-01T00:00:00Z"}
            ],
            "content": [
                {"id": "c1", "name": "Voting guide", "tags": ["elections"]}
            ]
        }"#;

        let catalog = parse_dataset(raw, "inline").unwrap();
        assert_eq!(catalog.counts(), (1, 1));

        let alice = catalog.get("p1").unwrap();
        assert_eq!(alice.kind, EntityKind::Politician);
        assert_eq!(alice.party.as_deref(), Some("Green"));
        assert!(alice.updated_at.is_some());

        let guide = catalog.get("c1").unwrap();
        assert_eq!(guide.kind, EntityKind::Content);
        assert_eq!(guide.popularity, 0.0);
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = parse_dataset("{ not json", "broken.json").unwrap_err();
        assert!(matches!(err, DataSourceError::Parse { file, .. } if file == "broken.json"));
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::load_from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, DataSourceError::FileNotFound { .. }));
    }
}
