use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// One offending field in a rejected payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error enumeration for storage-provider failures, shared by every repository trait.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Request-level error taxonomy serialized as `{error, message}` with a mapped HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{error}")]
    Unauthenticated { error: String, message: String },
    #[error("{error}")]
    Forbidden { error: String, message: String },
    #[error("{resource} not found")]
    NotFound {
        resource: String,
        message: Option<String>,
    },
    #[error("validation error")]
    Validation(Vec<FieldError>),
    #[error("{resource} already exists")]
    Conflict { resource: String },
    #[error("storage backend unavailable")]
    Upstream(#[source] RepositoryError),
    #[error("no test results available")]
    NoData { message: String },
}

impl ApiError {
    pub fn unauthenticated(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            message: None,
        }
    }

    pub fn not_found_with_hint(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            message: Some(message.into()),
        }
    }

    pub fn validation(details: Vec<FieldError>) -> Self {
        Self::Validation(details)
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::NoData { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ApiError::not_found("Resource"),
            RepositoryError::Conflict => ApiError::Conflict {
                resource: "Resource".to_string(),
            },
            RepositoryError::Unavailable(_) => ApiError::Upstream(value),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Unauthenticated { error, message }
            | ApiError::Forbidden { error, message } => {
                json!({ "error": error, "message": message })
            }
            ApiError::NotFound { resource, message } => match message {
                Some(message) => {
                    json!({ "error": format!("{resource} not found"), "message": message })
                }
                None => json!({ "error": format!("{resource} not found") }),
            },
            ApiError::Validation(details) => {
                json!({ "error": "Validation error", "details": details })
            }
            ApiError::Conflict { resource } => {
                json!({ "error": format!("{resource} already exists") })
            }
            ApiError::Upstream(source) => {
                // The provider failure detail goes to the log, never to the caller.
                tracing::error!(error = %source, "storage provider call failed");
                json!({ "error": "Internal server error" })
            }
            ApiError::NoData { message } => {
                json!({ "error": "No test results available", "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
