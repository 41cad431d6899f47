//! Structured API error responses with error codes.
//!
//! Component errors are mapped to stable machine-readable codes and HTTP
//! statuses here, in one place. Integrity findings never pass through this
//! module: a broken chain or a divergent mirror is reported in a 200
//! response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::infra::LedgerError;

/// Stable error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication (1xxx)
    /// No API key on a role-gated endpoint
    AuthRequired,
    /// Key present but unknown or revoked
    InvalidApiKey,
    /// Authenticated, but the wrong role for this endpoint
    RoleMismatch,

    // Rate limiting (2xxx)
    RateLimitExceeded,

    // Validation (3xxx)
    ValidationFailed,

    // Resources (4xxx)
    ResourceNotFound,

    // State machines (5xxx)
    /// Illegal transition, e.g. reviewing a terminal submission
    StateConflict,

    // Preconditions (6xxx)
    /// Operation impossible for the stored data, e.g. count < threshold
    PreconditionFailed,

    // Infrastructure (8xxx)
    PersistenceFailed,
    InternalError,
}

impl ErrorCode {
    pub fn numeric_code(&self) -> u32 {
        match self {
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidApiKey => 1002,
            ErrorCode::RoleMismatch => 1003,
            ErrorCode::RateLimitExceeded => 2001,
            ErrorCode::ValidationFailed => 3001,
            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::StateConflict => 5001,
            ErrorCode::PreconditionFailed => 6001,
            ErrorCode::PersistenceFailed => 8001,
            ErrorCode::InternalError => 8999,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ErrorCode::RoleMismatch => StatusCode::FORBIDDEN,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::StateConflict => StatusCode::CONFLICT,
            ErrorCode::PreconditionFailed => StatusCode::BAD_REQUEST,
            ErrorCode::PersistenceFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ErrorCode::RoleMismatch => "ROLE_MISMATCH",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::StateConflict => "STATE_CONFLICT",
            ErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorCode::PersistenceFailed => "PERSISTENCE_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{code}")
    }
}

/// Structured error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub numeric_code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                resource_id: None,
            },
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.error.resource_id = Some(id.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        if let Ok(value) = axum::http::HeaderValue::from_str(&code) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                value,
            );
        }

        response
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => ApiError::new(ErrorCode::ValidationFailed, msg),
            LedgerError::NotFound { resource, ref id } => {
                ApiError::new(ErrorCode::ResourceNotFound, err.to_string())
                    .with_resource_id(format!("{resource}/{id}"))
            }
            LedgerError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::StateConflict, err.to_string())
            }
            LedgerError::Precondition(msg) => ApiError::new(ErrorCode::PreconditionFailed, msg),
            LedgerError::Persistence(_) => {
                ApiError::new(ErrorCode::PersistenceFailed, err.to_string())
            }
            LedgerError::Serialization(_) => {
                ApiError::new(ErrorCode::InternalError, err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingKey => ApiError::new(ErrorCode::AuthRequired, err.to_string()),
            AuthError::InvalidKey => ApiError::new(ErrorCode::InvalidApiKey, err.to_string()),
            AuthError::RoleMismatch { .. } => {
                ApiError::new(ErrorCode::RoleMismatch, err.to_string())
            }
            AuthError::RateLimited => ApiError::new(ErrorCode::RateLimitExceeded, err.to_string()),
            AuthError::PartyNotFound(ref id) => {
                ApiError::new(ErrorCode::ResourceNotFound, err.to_string())
                    .with_resource_id(format!("party/{id}"))
            }
            AuthError::Validation(msg) => ApiError::new(ErrorCode::ValidationFailed, msg),
            AuthError::Ledger(inner) => inner.into(),
        }
    }
}

/// Shorthand for handler results.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
