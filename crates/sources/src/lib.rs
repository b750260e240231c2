//! # Sources Crate
//!
//! Typed recommendation requests and candidate resolution.
//!
//! ## Components
//!
//! ### Request types
//! [`RecommendationRequest`] and [`RecommendationContext`] carry the caller's
//! intent and optional signals. Absent signals are `None`, never zero.
//!
//! ### Catalog Source
//! [`CatalogSource`] fetches an over-sized candidate pool from the data
//! source, scoped by the request type, for the pipeline to filter and score.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CatalogSource, RecommendationRequest, RecommendationType};
//!
//! let source = CatalogSource::new(data_source.clone());
//! let request = RecommendationRequest::new("u1", RecommendationType::Politician)
//!     .with_limit(5)
//!     .with_excluded(["p3"]);
//!
//! let candidates = source.get_candidates(&request, request.limit).await?;
//! ```

pub mod catalog_source;
pub mod types;

pub use catalog_source::CatalogSource;
pub use types::{
    Candidate, DeviceType, RecommendationContext, RecommendationRequest, RecommendationType,
    TimeOfDay,
};
