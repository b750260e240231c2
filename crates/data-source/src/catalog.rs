//! In-memory catalog index.
//!
//! Holds every entity keyed by id plus secondary indices used by the data
//! source queries:
//! - entities of each kind ordered by popularity (desc), then id (asc)
//! - the sorted, de-duplicated list of searchable names

use crate::error::{DataSourceError, Result};
use crate::types::{CandidateScope, CatalogEntity, EntityId, EntityKind};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Catalog {
    // Primary store
    pub(crate) entities: HashMap<EntityId, CatalogEntity>,

    // Secondary indices, rebuilt by `build_secondary_indices`
    pub(crate) by_kind: HashMap<EntityKind, Vec<EntityId>>,
    pub(crate) ranked: Vec<EntityId>,
    pub(crate) names: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validated catalog from a list of entities.
    pub fn from_entities(entities: impl IntoIterator<Item = CatalogEntity>) -> Result<Self> {
        let mut catalog = Catalog::new();
        for entity in entities {
            if catalog.entities.contains_key(&entity.id) {
                return Err(DataSourceError::DuplicateEntity { id: entity.id });
            }
            catalog.insert(entity);
        }
        catalog.validate()?;
        catalog.build_secondary_indices();
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntity> {
        self.entities.get(id)
    }

    /// Insert or replace an entity. Call `build_secondary_indices` afterwards.
    pub fn insert(&mut self, entity: CatalogEntity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    /// Entity ids in ranked order for a scope.
    pub fn ranked_ids(&self, scope: CandidateScope) -> &[EntityId] {
        match scope {
            CandidateScope::All => &self.ranked,
            CandidateScope::Politicians => self.ids_of_kind(EntityKind::Politician),
            CandidateScope::Content => self.ids_of_kind(EntityKind::Content),
        }
    }

    pub fn ids_of_kind(&self, kind: EntityKind) -> &[EntityId] {
        self.by_kind.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Sorted, de-duplicated entity names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Counts per kind for debugging/validation: (politicians, content)
    pub fn counts(&self) -> (usize, usize) {
        (
            self.ids_of_kind(EntityKind::Politician).len(),
            self.ids_of_kind(EntityKind::Content).len(),
        )
    }

    pub fn build_secondary_indices(&mut self) {
        let mut ranked: Vec<&CatalogEntity> = self.entities.values().collect();
        ranked.sort_by(|a, b| rank_order(a, b));

        self.ranked = ranked.iter().map(|e| e.id.clone()).collect();

        self.by_kind.clear();
        for entity in &ranked {
            self.by_kind
                .entry(entity.kind)
                .or_insert_with(Vec::new)
                .push(entity.id.clone());
        }

        let mut names: Vec<String> = self.entities.values().map(|e| e.name.clone()).collect();
        names.sort();
        names.dedup();
        self.names = names;
    }

    /// Check that:
    /// - ids and names are non-empty
    /// - popularity is within [0, 1]
    /// - locations are valid coordinates
    pub fn validate(&self) -> Result<()> {
        for entity in self.entities.values() {
            if entity.id.trim().is_empty() {
                return Err(DataSourceError::InvalidValue {
                    field: "id".to_string(),
                    value: entity.id.clone(),
                });
            }
            if entity.name.trim().is_empty() {
                return Err(DataSourceError::InvalidValue {
                    field: format!("{}.name", entity.id),
                    value: entity.name.clone(),
                });
            }
            if !(0.0..=1.0).contains(&entity.popularity) {
                return Err(DataSourceError::InvalidValue {
                    field: format!("{}.popularity", entity.id),
                    value: entity.popularity.to_string(),
                });
            }
            if let Some(location) = entity.location {
                if !location.is_valid() {
                    return Err(DataSourceError::InvalidValue {
                        field: format!("{}.location", entity.id),
                        value: format!("{},{}", location.latitude, location.longitude),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Popularity descending, then id ascending.
fn rank_order(a: &CatalogEntity, b: &CatalogEntity) -> Ordering {
    b.popularity
        .partial_cmp(&a.popularity)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CatalogEntity> {
        vec![
            CatalogEntity::new("p2", EntityKind::Politician, "Bob Stone").with_popularity(0.5),
            CatalogEntity::new("p1", EntityKind::Politician, "Alice Park").with_popularity(0.5),
            CatalogEntity::new("c1", EntityKind::Content, "Budget explainer").with_popularity(0.9),
        ]
    }

    #[test]
    fn test_ranked_ids() {
        let catalog = Catalog::from_entities(sample()).unwrap();

        assert_eq!(catalog.ranked_ids(CandidateScope::All), ["c1", "p1", "p2"]);
        assert_eq!(catalog.ranked_ids(CandidateScope::Politicians), ["p1", "p2"]);
        assert_eq!(catalog.ranked_ids(CandidateScope::Content), ["c1"]);
        assert_eq!(catalog.counts(), (2, 1));
    }

    #[test]
    fn test_names_sorted() {
        let catalog = Catalog::from_entities(sample()).unwrap();
        assert_eq!(catalog.names(), ["Alice Park", "Bob Stone", "Budget explainer"]);
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut entities = sample();
        entities.push(CatalogEntity::new("p1", EntityKind::Politician, "Other"));

        let err = Catalog::from_entities(entities).unwrap_err();
        assert!(matches!(err, DataSourceError::DuplicateEntity { id } if id == "p1"));
    }

    #[test]
    fn test_rejects_out_of_range_popularity() {
        let entities = vec![CatalogEntity::new("p1", EntityKind::Politician, "A").with_popularity(1.5)];
        assert!(matches!(
            Catalog::from_entities(entities),
            Err(DataSourceError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_queries() {
        let catalog = Catalog::new();
        assert!(catalog.is_empty());
        assert!(catalog.get("p1").is_none());
        assert!(catalog.ranked_ids(CandidateScope::Politicians).is_empty());
    }
}
