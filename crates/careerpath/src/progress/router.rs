use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{LearningPlanUpdate, ProfileUpdate, ResultId};
use super::repository::{PlanRepository, ProfileRepository, ResultRepository};
use super::service::{ProgressService, ResultListQuery};
use crate::auth::TokenVerifier;
use crate::error::ApiError;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ShareRequest {
    #[serde(default = "default_true")]
    is_shared: bool,
}

/// Router builder for the per-user surface. Every route authenticates.
pub fn progress_router<P, R, L, V>(service: Arc<ProgressService<P, R, L, V>>) -> Router
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    Router::new()
        .route(
            "/api/users/profile",
            get(profile_handler::<P, R, L, V>).put(update_profile_handler::<P, R, L, V>),
        )
        .route("/api/users/results", get(results_handler::<P, R, L, V>))
        .route(
            "/api/users/results/:result_id",
            get(result_handler::<P, R, L, V>).delete(delete_result_handler::<P, R, L, V>),
        )
        .route(
            "/api/users/results/:result_id/share",
            post(share_result_handler::<P, R, L, V>),
        )
        .route("/api/users/stats", get(stats_handler::<P, R, L, V>))
        .route(
            "/api/users/learning-plan",
            get(learning_plan_handler::<P, R, L, V>)
                .put(replace_learning_plan_handler::<P, R, L, V>),
        )
        .route(
            "/api/users/learning-plan/generate",
            post(generate_learning_plan_handler::<P, R, L, V>),
        )
        .with_state(service)
}

async fn profile_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let profile = service.profile(&user, Utc::now())?;
    Ok(Json(profile).into_response())
}

async fn update_profile_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let profile = service.update_profile(&user, update, Utc::now())?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile,
    }))
    .into_response())
}

async fn results_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
    Query(query): Query<ResultListQuery>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let page = service.results(&user, &query)?;
    Ok(Json(page).into_response())
}

async fn result_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
    Path(result_id): Path<String>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let result = service.result(&user, &ResultId(result_id))?;
    Ok(Json(result).into_response())
}

async fn delete_result_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
    Path(result_id): Path<String>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    service.delete_result(&user, &ResultId(result_id))?;
    Ok(Json(json!({ "message": "Test result deleted successfully" })).into_response())
}

async fn share_result_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
    Path(result_id): Path<String>,
    body: Option<Json<ShareRequest>>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let is_shared = body.map(|Json(request)| request.is_shared).unwrap_or(true);
    let outcome = service.share_result(&user, &ResultId(result_id), is_shared)?;

    let message = if is_shared {
        "Result shared successfully"
    } else {
        "Result sharing disabled"
    };
    Ok(Json(json!({
        "message": message,
        "result": outcome.result,
        "share_url": outcome.share_url,
    }))
    .into_response())
}

async fn stats_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let stats = service.stats(&user)?;
    Ok(Json(stats).into_response())
}

async fn learning_plan_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let plan = service.learning_plan(&user)?;
    Ok(Json(plan).into_response())
}

async fn generate_learning_plan_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let plan = service.generate_learning_plan(&user, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Learning plan generated successfully",
            "learning_plan": plan,
        })),
    )
        .into_response())
}

async fn replace_learning_plan_handler<P, R, L, V>(
    State(service): State<Arc<ProgressService<P, R, L, V>>>,
    headers: HeaderMap,
    Json(update): Json<LearningPlanUpdate>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let plan = service.replace_learning_plan(&user, update, Utc::now())?;
    Ok(Json(json!({
        "message": "Learning plan updated successfully",
        "learning_plan": plan,
    }))
    .into_response())
}
