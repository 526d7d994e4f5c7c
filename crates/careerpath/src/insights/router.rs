use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use super::export::ExportKind;
use super::service::{ExportDocument, InsightsService, DEFAULT_PERFORMANCE_WINDOW_DAYS};
use crate::auth::TokenVerifier;
use crate::catalog::repository::TestRepository;
use crate::error::ApiError;
use crate::progress::repository::{ProfileRepository, ResultRepository};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct PerformanceQuery {
    days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExportQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    format: Option<String>,
}

/// Router builder for the admin analytics surface. Every route is admin-only.
pub fn insights_router<P, T, R, V>(service: Arc<InsightsService<P, T, R, V>>) -> Router
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    Router::new()
        .route("/api/analytics/overview", get(overview_handler::<P, T, R, V>))
        .route("/api/analytics/tests", get(tests_handler::<P, T, R, V>))
        .route("/api/analytics/users", get(users_handler::<P, T, R, V>))
        .route(
            "/api/analytics/performance",
            get(performance_handler::<P, T, R, V>),
        )
        .route("/api/analytics/export", get(export_handler::<P, T, R, V>))
        .with_state(service)
}

async fn overview_handler<P, T, R, V>(
    State(service): State<Arc<InsightsService<P, T, R, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let overview = service.overview(Utc::now())?;
    Ok(Json(overview).into_response())
}

async fn tests_handler<P, T, R, V>(
    State(service): State<Arc<InsightsService<P, T, R, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let report = service.test_analytics()?;
    Ok(Json(report).into_response())
}

async fn users_handler<P, T, R, V>(
    State(service): State<Arc<InsightsService<P, T, R, V>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let report = service.user_analytics(Utc::now())?;
    Ok(Json(report).into_response())
}

async fn performance_handler<P, T, R, V>(
    State(service): State<Arc<InsightsService<P, T, R, V>>>,
    headers: HeaderMap,
    Query(query): Query<PerformanceQuery>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;
    let days = query.days.unwrap_or(DEFAULT_PERFORMANCE_WINDOW_DAYS);
    let report = service.performance(days, Utc::now())?;
    Ok(Json(report).into_response())
}

async fn export_handler<P, T, R, V>(
    State(service): State<Arc<InsightsService<P, T, R, V>>>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError>
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    service.auth().require_admin(&headers)?;

    let kind = query.kind.as_deref().unwrap_or("results");
    let kind = ExportKind::parse(kind)
        .ok_or_else(|| ApiError::invalid_field("type", "must be one of: results, users"))?;
    let as_csv = query.format.as_deref().unwrap_or("csv") == "csv";

    match service.export(kind, as_csv, Utc::now())? {
        ExportDocument::Csv(document) => {
            let disposition = format!("attachment; filename=\"{}\"", document.filename);
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                document.body,
            )
                .into_response())
        }
        ExportDocument::Json(payload) => Ok(Json(payload).into_response()),
    }
}
