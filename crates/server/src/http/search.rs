//! Search handlers. Failures here always carry `data: []`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;

use super::params::{optional_limit, RelatedParams, SuggestionParams};
use super::{guarded, ApiError, AppState};
use ::search::{is_searchable, MIN_QUERY_CHARS};

/// GET /search/suggestions
pub async fn get_suggestions(
    State(state): State<AppState>,
    params: Result<Query<SuggestionParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::from(e).with_empty_data())?;
    let query = params.q.unwrap_or_default();
    let limit = optional_limit(params.limit.as_deref()).map_err(|e| ApiError::from(e).with_empty_data())?;

    if !is_searchable(&query) {
        return Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": [],
                "message": format!("Query must be at least {MIN_QUERY_CHARS} characters"),
            })),
        )
            .into_response());
    }
    info!("Suggestions request for {:?}", query);

    let search = state.search.clone();
    let lookup = query.clone();
    let data = guarded(state.request_timeout, |cancel| async move {
        search.get_suggestions(&lookup, limit, &cancel).await
    })
    .await
    .map_err(|e| ApiError::from(e).with_empty_data())?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
            "query": query.trim(),
        })),
    )
        .into_response())
}

/// GET /search/related
pub async fn get_related(
    State(state): State<AppState>,
    params: Result<Query<RelatedParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::from(e).with_empty_data())?;
    let id = params.id.unwrap_or_default();
    let limit = optional_limit(params.limit.as_deref()).map_err(|e| ApiError::from(e).with_empty_data())?;
    info!("Related politicians request for {:?}", id);

    let search = state.search.clone();
    let lookup = id.clone();
    let data = guarded(state.request_timeout, |cancel| async move {
        search.get_related_politicians(&lookup, limit, &cancel).await
    })
    .await
    .map_err(|e| ApiError::from(e).with_empty_data())?;

    let total = data.len();
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
            "politicianId": id.trim(),
            "total": total,
        })),
    )
        .into_response())
}
