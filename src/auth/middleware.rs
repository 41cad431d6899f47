//! Authentication middleware for Axum.
//!
//! Reads the `X-API-Key` header, resolves it against the auth store and
//! stashes the caller's identity in the request extensions. Requests without
//! a key pass through anonymously; role-gated handlers reject them with 401.
//! A key that is present but unknown or revoked is rejected here with 401,
//! including on public endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::Party;

use super::AuthStore;

/// Header carrying the raw API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware state.
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<AuthStore>,
}

/// The authenticated caller, if any, as a request extension.
#[derive(Clone)]
pub struct CallerIdentity(pub Option<Party>);

/// Authentication middleware.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let caller = match header {
        None => CallerIdentity(None),
        Some(raw_key) => match state.store.authenticate(&raw_key) {
            Some(party) => CallerIdentity(Some(party)),
            None => {
                return (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(serde_json::json!({
                        "error": {
                            "code": "INVALID_API_KEY",
                            "message": "Invalid or revoked API key",
                        }
                    })),
                )
                    .into_response();
            }
        },
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}
