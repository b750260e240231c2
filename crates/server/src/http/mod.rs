//! JSON/HTTP boundary.
//!
//! GET|POST /recommendations - ranked recommendations
//! POST /recommendations/feedback - record feedback
//! GET /search/suggestions - typeahead names
//! GET /search/related - politicians similar to one
//! GET /health - liveness

pub mod error;
pub mod params;
pub mod recommendations;
pub mod search;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Json, Router,
};
use resilience::{CancellationToken, ClassifiedError, ErrorKind, Result};
use serde_json::{json, Value};

use crate::engine::RecommendationEngine;
use ::search::SearchService;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub search: Arc<SearchService>,
    pub request_timeout: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/recommendations",
            get(recommendations::get_recommendations).post(recommendations::post_recommendations),
        )
        .route("/recommendations/feedback", post(recommendations::post_feedback))
        .route("/search/suggestions", get(search::get_suggestions))
        .route("/search/related", get(search::get_related))
        .route("/health", get(health))
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run `operation` with a request-scoped cancellation token and timeout.
///
/// The token is cancelled when this future completes or is dropped (client
/// went away), and when the timeout elapses, so pending retry waits end and
/// no further attempts start.
pub(crate) async fn guarded<T, F, Fut>(timeout: Duration, operation: F) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();

    match tokio::time::timeout(timeout, operation(token)).await {
        Ok(result) => result,
        Err(_) => Err(ClassifiedError::builder(
            ErrorKind::TransientBackend,
            format!("request timed out after {timeout:?}"),
        )
        .build()),
    }
}
