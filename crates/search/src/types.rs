use data_source::CatalogEntity;
use serde::Serialize;

/// Default number of results when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 10;
/// Upper bound on any search result list.
pub const MAX_LIMIT: usize = 50;
/// Trimmed queries shorter than this return no suggestions.
pub const MIN_QUERY_CHARS: usize = 2;

/// Clamp an optional caller-supplied limit into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Whether `query` is long enough to be worth a lookup.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

/// A politician similar to the one being viewed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPolitician {
    #[serde(flatten)]
    pub entity: CatalogEntity,
    /// Weighted share of matching attributes, in (0, 1]
    pub similarity: f32,
    /// Names of the attributes both politicians share
    pub shared_attributes: Vec<&'static str>,
}
