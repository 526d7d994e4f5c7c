use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::{Authenticator, TokenVerifier};
use crate::error::ApiError;
use crate::progress::repository::ProfileRepository;

/// Identity endpoints: explicit token verification and the merged
/// identity-plus-profile view of the current caller.
pub struct IdentityService<V, P> {
    auth: Arc<Authenticator<V>>,
    profiles: Arc<P>,
}

impl<V, P> IdentityService<V, P>
where
    V: TokenVerifier + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(auth: Arc<Authenticator<V>>, profiles: Arc<P>) -> Self {
        Self { auth, profiles }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    token: String,
}

/// Router builder for the identity surface.
pub fn identity_router<V, P>(service: Arc<IdentityService<V, P>>) -> Router
where
    V: TokenVerifier + 'static,
    P: ProfileRepository + 'static,
{
    Router::new()
        .route("/api/auth/verify", post(verify_handler::<V, P>))
        .route("/api/auth/me", get(me_handler::<V, P>))
        .with_state(service)
}

async fn verify_handler<V, P>(
    State(service): State<Arc<IdentityService<V, P>>>,
    Json(request): Json<VerifyRequest>,
) -> Response
where
    V: TokenVerifier + 'static,
    P: ProfileRepository + 'static,
{
    if request.token.trim().is_empty() {
        return ApiError::invalid_field("token", "is required").into_response();
    }

    match service.auth.verify_token(&request.token) {
        Ok(user) => Json(json!({
            "valid": true,
            "user": { "id": user.id, "email": user.email },
        }))
        .into_response(),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "error": "Invalid or expired token" })),
        )
            .into_response(),
    }
}

async fn me_handler<V, P>(
    State(service): State<Arc<IdentityService<V, P>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    V: TokenVerifier + 'static,
    P: ProfileRepository + 'static,
{
    let user = service.auth.authenticate(&headers)?;
    let profile = service.profiles.fetch(&user.id)?;

    let payload = json!({
        "id": user.id,
        "email": user.email,
        "name": profile.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
        "bio": profile.as_ref().map(|p| p.bio.clone()).unwrap_or_default(),
        "age": profile.as_ref().and_then(|p| p.age),
        "education": profile.as_ref().map(|p| p.education.clone()).unwrap_or_default(),
        "experience": profile.as_ref().map(|p| p.experience.clone()).unwrap_or_default(),
        "avatar_url": profile.as_ref().map(|p| p.avatar_url.clone()).unwrap_or_default(),
    });
    Ok(Json(payload).into_response())
}
