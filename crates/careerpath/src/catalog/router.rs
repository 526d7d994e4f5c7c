use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use super::domain::{TestDraft, TestId};
use super::service::{CatalogService, ResultSubmission, TestListQuery};
use crate::auth::TokenVerifier;
use crate::catalog::repository::TestRepository;
use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::progress::repository::ResultRepository;

/// Router builder for the test catalog surface.
pub fn catalog_router<T, R, V>(service: Arc<CatalogService<T, R, V>>) -> Router
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    Router::new()
        .route(
            "/api/tests",
            get(list_handler::<T, R, V>).post(create_handler::<T, R, V>),
        )
        .route("/api/tests/categories", get(categories_handler::<T, R, V>))
        .route("/api/tests/stats", get(stats_handler::<T, R, V>))
        .route(
            "/api/tests/:test_id",
            get(detail_handler::<T, R, V>)
                .put(update_handler::<T, R, V>)
                .delete(deactivate_handler::<T, R, V>),
        )
        .route(
            "/api/tests/:test_id/submit",
            post(submit_handler::<T, R, V>),
        )
        .route(
            "/api/tests/:test_id/results",
            get(test_results_handler::<T, R, V>),
        )
        .with_state(service)
}

async fn list_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    Query(query): Query<TestListQuery>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    let page = service.list(&query)?;
    Ok(Json(page).into_response())
}

async fn categories_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    let categories = service.categories()?;
    Ok(Json(json!({ "categories": categories })).into_response())
}

async fn stats_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    let stats = service.stats()?;
    Ok(Json(stats).into_response())
}

async fn detail_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    headers: HeaderMap,
    Path(test_id): Path<String>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    let viewer = service.auth().maybe_authenticate(&headers);
    let detail = service.detail(&TestId(test_id), viewer.as_ref())?;
    Ok(Json(detail).into_response())
}

async fn create_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    headers: HeaderMap,
    Json(draft): Json<TestDraft>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let test = service.create(draft, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Test created successfully", "test": test })),
    )
        .into_response())
}

async fn update_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    headers: HeaderMap,
    Path(test_id): Path<String>,
    Json(draft): Json<TestDraft>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let test = service.update(&TestId(test_id), draft, Utc::now())?;
    Ok(Json(json!({ "message": "Test updated successfully", "test": test })).into_response())
}

async fn deactivate_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    headers: HeaderMap,
    Path(test_id): Path<String>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let test = service.deactivate(&TestId(test_id), Utc::now())?;
    Ok(Json(json!({ "message": "Test deactivated successfully", "test": test })).into_response())
}

async fn submit_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    headers: HeaderMap,
    Path(test_id): Path<String>,
    Json(submission): Json<ResultSubmission>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    let user = service.auth().authenticate(&headers)?;
    let result = service.submit(&user, &TestId(test_id), submission, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Test result saved successfully",
            "result": {
                "id": result.id,
                "total_score": result.total_score,
                "category_scores": result.category_scores,
                "created_at": result.created_at,
            },
        })),
    )
        .into_response())
}

async fn test_results_handler<T, R, V>(
    State(service): State<Arc<CatalogService<T, R, V>>>,
    headers: HeaderMap,
    Path(test_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Response, ApiError>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let results = service.results_for_test(&TestId(test_id), page)?;
    Ok(Json(results).into_response())
}
