use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use careerpath::auth::router::{identity_router, IdentityService};
use careerpath::auth::{AdminPolicy, Authenticator};
use careerpath::catalog::{catalog_router, samples, CatalogService};
use careerpath::community::{community_router, CommunityService};
use careerpath::config::AppConfig;
use careerpath::insights::{insights_router, InsightsService};
use careerpath::progress::{progress_router, ProgressService};
use careerpath::telemetry;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryFeedbackStore, InMemoryPlanStore, InMemoryProfileStore, InMemoryResultStore,
    InMemoryTestStore, StaticTokenVerifier,
};
use crate::routes::{healthcheck, metrics_endpoint, readiness_endpoint};
use crate::ServiceError;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), ServiceError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let tests = Arc::new(InMemoryTestStore::seeded(samples::sample_tests()));
    let results = Arc::new(InMemoryResultStore::default());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let plans = Arc::new(InMemoryPlanStore::default());
    let feedback = Arc::new(InMemoryFeedbackStore::default());

    let verifier = Arc::new(StaticTokenVerifier::from_env());
    let authenticator = Arc::new(Authenticator::new(
        verifier,
        AdminPolicy::from(&config.auth),
    ));

    let catalog = Arc::new(CatalogService::new(
        tests.clone(),
        results.clone(),
        authenticator.clone(),
    ));
    let progress = Arc::new(ProgressService::new(
        profiles.clone(),
        results.clone(),
        plans,
        authenticator.clone(),
        config.sharing.clone(),
    ));
    let community = Arc::new(CommunityService::new(
        profiles.clone(),
        results.clone(),
        feedback,
        authenticator.clone(),
    ));
    let insights = Arc::new(InsightsService::new(
        profiles.clone(),
        tests,
        results,
        authenticator.clone(),
    ));
    let identity = Arc::new(IdentityService::new(authenticator, profiles));

    let app = catalog_router(catalog)
        .merge(progress_router(progress))
        .merge(community_router(community))
        .merge(insights_router(insights))
        .merge(identity_router(identity))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "career orientation platform ready");

    axum::serve(listener, app).await?;
    Ok(())
}
