//! Caller identity and the authorization predicates evaluated before every mutation.
//!
//! Authentication always runs before authorization: a missing or invalid token
//! yields `Unauthenticated` even on admin-only routes, and ownership/admin
//! checks only ever see an already-verified identity.

pub mod router;

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Legacy header fallback accepted alongside the `Authorization` bearer scheme.
pub const LEGACY_TOKEN_HEADER: &str = "apikey";

/// Verified identity returned by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AuthenticatedUser {
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous")
            .to_string()
    }
}

/// Identity-provider failure unrelated to token validity.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to the external auth provider's token verification operation.
///
/// `Ok(None)` means the token is invalid or expired; `Err` means the provider
/// itself could not be reached.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, VerifierError>;
}

/// Explicit allow-list deciding who counts as an administrator.
#[derive(Debug, Clone)]
pub struct AdminPolicy {
    admin_domain: String,
}

impl AdminPolicy {
    pub fn new(admin_domain: impl Into<String>) -> Self {
        Self {
            admin_domain: admin_domain.into(),
        }
    }

    /// Admin iff the e-mail domain matches the configured domain or the
    /// session carries an explicit `admin` role claim. Never inferred from
    /// resource ownership.
    pub fn is_admin(&self, user: &AuthenticatedUser) -> bool {
        let suffix = format!("@{}", self.admin_domain);
        user.email.ends_with(&suffix) || user.role.as_deref() == Some("admin")
    }
}

impl From<&AuthConfig> for AdminPolicy {
    fn from(config: &AuthConfig) -> Self {
        Self::new(config.admin_domain.clone())
    }
}

/// Composes the token verifier with the admin policy for per-request checks.
pub struct Authenticator<V> {
    verifier: Arc<V>,
    policy: AdminPolicy,
}

impl<V: TokenVerifier> Authenticator<V> {
    pub fn new(verifier: Arc<V>, policy: AdminPolicy) -> Self {
        Self { verifier, policy }
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    /// Pull the bearer token out of the headers, falling back to the legacy header.
    pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        bearer.or_else(|| {
            headers
                .get(LEGACY_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
        })
    }

    /// Required authentication: no token or an unverifiable token is rejected
    /// with `Unauthenticated`, never silently downgraded to anonymous.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, ApiError> {
        let token = Self::bearer_token(headers).ok_or_else(|| {
            ApiError::unauthenticated(
                "No token provided",
                "Authorization header with Bearer token is required",
            )
        })?;

        self.verify_token(&token)
    }

    /// Verify an explicit token string (the `/auth/verify` operation).
    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        match self.verifier.verify(token) {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ApiError::unauthenticated(
                "Invalid token",
                "The provided token is invalid or expired",
            )),
            Err(error) => {
                tracing::warn!(%error, "token verification failed");
                Err(ApiError::unauthenticated(
                    "Authentication failed",
                    "Unable to authenticate the request",
                ))
            }
        }
    }

    /// Optional authentication: verification failures are swallowed and the
    /// request proceeds anonymously.
    pub fn maybe_authenticate(&self, headers: &HeaderMap) -> Option<AuthenticatedUser> {
        let token = Self::bearer_token(headers)?;
        self.verifier.verify(&token).ok().flatten()
    }

    /// Authentication followed by the admin allow-list check, in that order.
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, ApiError> {
        let user = self.authenticate(headers)?;
        if self.policy.is_admin(&user) {
            Ok(user)
        } else {
            Err(ApiError::forbidden(
                "Admin access required",
                "You do not have permission to access this resource",
            ))
        }
    }
}

/// Owner check by exact identity-id equality; mismatch is `Forbidden`,
/// distinct from `Unauthenticated`.
pub fn require_owner(user: &AuthenticatedUser, resource_owner_id: &str) -> Result<(), ApiError> {
    if user.id == resource_owner_id {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Access denied",
            "You can only access your own resources",
        ))
    }
}

/// Shared-flag visibility predicate: a resource is public iff explicitly shared.
pub fn is_public(is_shared: bool) -> bool {
    is_shared
}
