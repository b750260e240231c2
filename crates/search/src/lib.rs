//! # Search Crate
//!
//! Typeahead suggestions and "related politicians" over the data source.
//!
//! Both operations run their data-source calls through the shared
//! [`RetryExecutor`](resilience::RetryExecutor): suggestions with the
//! `fast_best_effort` preset, related lookups with `standard`.
//!
//! ## Example Usage
//!
//! ```ignore
//! use search::SearchService;
//! use resilience::CancellationToken;
//!
//! let search = SearchService::new(data_source.clone());
//! let names = search.get_suggestions("smi", Some(5), &CancellationToken::new()).await?;
//! let related = search.get_related_politicians("p1", None, &CancellationToken::new()).await?;
//! ```

pub mod fuzzy;
pub mod service;
pub mod types;

pub use service::SearchService;
pub use types::{clamp_limit, is_searchable, RelatedPolitician, DEFAULT_LIMIT, MAX_LIMIT, MIN_QUERY_CHARS};
