//! # Data Source Crate
//!
//! The data-access collaborator for the recommendation and search engines.
//!
//! ## Main Components
//!
//! - **types**: Catalog entities, geo points, feedback events
//! - **catalog**: In-memory [`Catalog`] index with ranked secondary indices
//! - **loader**: Parse JSON dataset files into a [`Catalog`]
//! - **source**: The async [`DataSource`] trait and [`InMemoryDataSource`]
//! - **error**: [`DataSourceError`] and its mapping into the shared taxonomy
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_source::{Catalog, DataSource, InMemoryDataSource, CandidateScope};
//! use std::{path::Path, sync::Arc};
//!
//! let catalog = Arc::new(Catalog::load_from_file(Path::new("data/catalog.json"))?);
//! let source = InMemoryDataSource::new(catalog);
//!
//! let top = source.candidates(CandidateScope::Politicians, None, 30).await?;
//! ```

pub mod catalog;
pub mod error;
pub mod loader;
pub mod source;
pub mod types;

pub use catalog::Catalog;
pub use error::{DataSourceError, Result};
pub use loader::parse_dataset;
pub use source::{DataSource, InMemoryDataSource};
pub use types::{
    // Type aliases
    EntityId,
    UserId,
    // Core types
    CatalogEntity,
    FeedbackEvent,
    GeoPoint,
    SharedAttributes,
    // Enums
    CandidateScope,
    EntityKind,
    FeedbackKind,
    FeedbackUpsert,
};
