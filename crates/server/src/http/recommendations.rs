//! Recommendation and feedback handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sources::RecommendationRequest;
use tracing::info;

use super::params::{recommendation_request_from_query, FeedbackBody, RecommendationBody};
use super::{guarded, ApiError, AppState};

/// GET /recommendations
pub async fn get_recommendations(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = pairs?;
    let request = recommendation_request_from_query(pairs, state.engine.settings().default_limit)?;
    recommend(state, request).await
}

/// POST /recommendations
pub async fn post_recommendations(
    State(state): State<AppState>,
    body: Result<Json<RecommendationBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let request = body.into_request(state.engine.settings().default_limit)?;
    recommend(state, request).await
}

async fn recommend(state: AppState, mut request: RecommendationRequest) -> Result<Response, ApiError> {
    info!("Recommendations request for user {:?} ({:?})", request.user_id, request.kind);
    request.limit = state.engine.clamp_limit(request.limit);

    let engine = state.engine.clone();
    let pending = request.clone();
    let data = guarded(state.request_timeout, |cancel| async move {
        engine.generate_recommendations(&pending, &cancel).await
    })
    .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
            "request": request,
        })),
    )
        .into_response())
}

/// POST /recommendations/feedback
pub async fn post_feedback(
    State(state): State<AppState>,
    body: Result<Json<FeedbackBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let (user_id, recommendation_id, feedback) = body.required_fields()?;
    info!("Feedback {:?} from {} on {}", feedback, user_id, recommendation_id);

    let engine = state.engine.clone();
    let event = guarded(state.request_timeout, |cancel| async move {
        engine
            .update_recommendation_models(&user_id, &recommendation_id, &feedback, &cancel)
            .await
    })
    .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Feedback recorded successfully",
            "data": event,
        })),
    )
        .into_response())
}
