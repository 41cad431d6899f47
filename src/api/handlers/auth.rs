//! Party registration, key management and auth introspection.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Extension, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::auth::{AuthError, CallerIdentity};
use crate::domain::{PartyInfo, PartyRole};
use crate::server::AppState;

use super::require_party;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub role: PartyRole,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub party_id: String,
    pub name: String,
    pub role: PartyRole,
    /// Shown exactly once; only its hash is stored.
    pub api_key: String,
}

/// POST /auth/register - rate limited per client IP.
pub async fn register(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.registration_gate.check(&client_ip) {
        return Err(AuthError::RateLimited.into());
    }

    let (party, api_key) = state.auth_store.register(&request.name, request.role)?;
    Ok(Json(RegisterResponse {
        party_id: party.party_id,
        name: party.name,
        role: party.role,
        api_key,
    }))
}

/// GET /auth/parties - public directory, hashes excluded.
pub async fn list_parties(State(state): State<AppState>) -> Json<Vec<PartyInfo>> {
    Json(
        state
            .auth_store
            .list()
            .iter()
            .map(|p| p.to_public())
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub party_id: String,
    pub revoked: bool,
}

/// DELETE /auth/parties/:party_id - demo admin surface; the record stays,
/// revoked, for auditability.
pub async fn revoke_party(
    State(state): State<AppState>,
    Path(party_id): Path<String>,
) -> ApiResult<Json<RevokeResponse>> {
    let party = state.auth_store.revoke(&party_id)?;
    Ok(Json(RevokeResponse {
        party_id: party.party_id,
        revoked: party.revoked,
    }))
}

/// GET /auth/me
pub async fn me(Extension(caller): Extension<CallerIdentity>) -> ApiResult<Json<PartyInfo>> {
    let party = require_party(&caller)?;
    Ok(Json(party.to_public()))
}

#[derive(Debug, Serialize)]
pub struct RotateKeyResponse {
    pub party_id: String,
    /// Shown exactly once; the old key is already invalid.
    pub api_key: String,
    pub message: String,
}

/// POST /auth/rotate-key - replaces the caller's key atomically.
pub async fn rotate_key(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<RotateKeyResponse>> {
    let party = require_party(&caller)?;
    let api_key = state.auth_store.rotate(&party.party_id)?;
    Ok(Json(RotateKeyResponse {
        party_id: party.party_id,
        api_key,
        message: "API key rotated; the previous key no longer authenticates.".to_string(),
    }))
}

/// POST /demo/auth-reset - clears the party store and rate-limiter state.
pub async fn reset_auth(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.auth_store.reset()?;
    state.registration_gate.reset();
    Ok(Json(serde_json::json!({ "message": "auth store and rate limiter reset" })))
}
