//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod current_entity;
pub mod excluded_ids;

// Re-export for convenience
pub use current_entity::CurrentEntityFilter;
pub use excluded_ids::ExcludedIdsFilter;
