//! Server crate for the Civic Recs recommendation service.
//!
//! This crate contains the engine that coordinates the recommendation
//! pipeline, the application configuration, and the axum HTTP boundary.

pub mod config;
pub mod engine;
pub mod http;

pub use config::{AppConfig, ConfigError, EngineSettings, RetryPresets};
pub use engine::RecommendationEngine;
pub use http::{router, AppState};

use data_source::DataSource;
use search::SearchService;
use std::sync::Arc;

/// Wire the engine and search service over one data source.
pub fn build_state(data_source: Arc<dyn DataSource>, config: &AppConfig) -> AppState {
    let engine = RecommendationEngine::new(data_source.clone(), config.engine.clone(), config.retry.clone());
    let search = SearchService::new(data_source)
        .with_policies(config.retry.fast_best_effort.clone(), config.retry.standard.clone());

    AppState {
        engine: Arc::new(engine),
        search: Arc::new(search),
        request_timeout: config.server.request_timeout(),
    }
}
