use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::FeedbackRequest;
use super::repository::FeedbackRepository;
use super::service::{CommunityService, DEFAULT_LEADERBOARD_LIMIT};
use crate::auth::TokenVerifier;
use crate::catalog::domain::TestId;
use crate::error::ApiError;
use crate::progress::domain::ResultId;
use crate::progress::repository::{ProfileRepository, ResultRepository};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

/// Router builder for the public/comparison surface.
pub fn community_router<P, R, F, V>(service: Arc<CommunityService<P, R, F, V>>) -> Router
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    Router::new()
        .route(
            "/api/results/shared/:result_id",
            get(shared_result_handler::<P, R, F, V>),
        )
        .route(
            "/api/results/leaderboard/:test_id",
            get(leaderboard_handler::<P, R, F, V>),
        )
        .route(
            "/api/results/analytics/category/:category",
            get(category_analytics_handler::<P, R, F, V>),
        )
        .route(
            "/api/results/compare/:test_id",
            get(compare_handler::<P, R, F, V>),
        )
        .route(
            "/api/results/:result_id/feedback",
            post(feedback_handler::<P, R, F, V>),
        )
        .with_state(service)
}

async fn shared_result_handler<P, R, F, V>(
    State(service): State<Arc<CommunityService<P, R, F, V>>>,
    Path(result_id): Path<String>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    let view = service.shared_result(&ResultId(result_id))?;
    Ok(Json(view).into_response())
}

async fn leaderboard_handler<P, R, F, V>(
    State(service): State<Arc<CommunityService<P, R, F, V>>>,
    Path(test_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let view = service.leaderboard(&TestId(test_id), limit)?;
    Ok(Json(view).into_response())
}

async fn category_analytics_handler<P, R, F, V>(
    State(service): State<Arc<CommunityService<P, R, F, V>>>,
    Path(category): Path<String>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    let analytics = service.category_analytics(&category)?;
    Ok(Json(analytics).into_response())
}

async fn compare_handler<P, R, F, V>(
    State(service): State<Arc<CommunityService<P, R, F, V>>>,
    headers: HeaderMap,
    Path(test_id): Path<String>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let report = service.compare(&user, &TestId(test_id))?;
    Ok(Json(report).into_response())
}

async fn feedback_handler<P, R, F, V>(
    State(service): State<Arc<CommunityService<P, R, F, V>>>,
    headers: HeaderMap,
    Path(result_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let feedback = service.submit_feedback(&user, &ResultId(result_id), request, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Feedback saved successfully",
            "feedback": feedback,
        })),
    )
        .into_response())
}
