//! Concern lifecycle endpoints.

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult, ErrorCode};
use crate::auth::CallerIdentity;
use crate::crypto::anonymous_id;
use crate::domain::{
    Concern, ConcernResponse, ConcernStatus, LedgerStats, PartyRole, Resolution,
    ResolutionOutcome, ResponderRole,
};
use crate::server::AppState;

use super::require_role;

#[derive(Debug, Deserialize)]
pub struct AnonymousIdRequest {
    pub identity: String,
    pub salt: String,
}

#[derive(Debug, Serialize)]
pub struct AnonymousIdResponse {
    pub anonymous_id: String,
    pub message: String,
}

/// POST /transparency/anonymous-id - derive a pseudonym server-side.
///
/// Deprecated: clients should derive the ID locally so identity and salt
/// never cross the wire. Kept for older clients; the inputs are used for the
/// derivation only and are never persisted.
pub async fn derive_anonymous_id(
    Json(request): Json<AnonymousIdRequest>,
) -> ApiResult<Json<AnonymousIdResponse>> {
    if request.identity.is_empty() {
        return Err(ApiError::new(
            ErrorCode::ValidationFailed,
            "identity must not be empty",
        ));
    }
    if request.salt.len() < 8 {
        return Err(ApiError::new(
            ErrorCode::ValidationFailed,
            "salt must be at least 8 characters",
        ));
    }

    Ok(Json(AnonymousIdResponse {
        anonymous_id: anonymous_id(&request.identity, &request.salt),
        message: "Derive this ID locally where possible; the server does not store the inputs."
            .to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RaiseConcernRequest {
    pub anon_id: String,
    pub title: String,
    pub description: String,
    pub target: String,
}

/// POST /transparency/concerns - anyone may raise a concern.
pub async fn raise_concern(
    State(state): State<AppState>,
    Json(request): Json<RaiseConcernRequest>,
) -> ApiResult<Json<Concern>> {
    let concern = state.transparency.raise_concern(
        request.anon_id,
        request.title,
        request.description,
        request.target,
    )?;
    Ok(Json(concern))
}

#[derive(Debug, Deserialize)]
pub struct ConcernsQuery {
    pub status: Option<ConcernStatus>,
    pub target: Option<String>,
}

/// GET /transparency/concerns
pub async fn list_concerns(
    State(state): State<AppState>,
    Query(query): Query<ConcernsQuery>,
) -> Json<Vec<Concern>> {
    Json(
        state
            .transparency
            .list_concerns(query.status, query.target.as_deref()),
    )
}

/// GET /transparency/concerns/:id
pub async fn get_concern(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Concern>> {
    Ok(Json(state.transparency.get_concern(&id)?))
}

/// GET /transparency/concerns/:id/responses
pub async fn list_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ConcernResponse>>> {
    Ok(Json(state.transparency.responses_for(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub concern_id: String,
    pub responder_role: ResponderRole,
    pub content: String,
}

/// POST /transparency/responses
pub async fn respond(
    State(state): State<AppState>,
    Json(request): Json<RespondRequest>,
) -> ApiResult<Json<ConcernResponse>> {
    let response = state.transparency.respond(
        &request.concern_id,
        request.responder_role,
        request.content,
    )?;
    Ok(Json(response))
}

/// POST /transparency/concerns/:id/dispute
pub async fn dispute_concern(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Concern>> {
    Ok(Json(state.transparency.dispute(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub concern_id: String,
    pub outcome: ResolutionOutcome,
    pub notes: String,
}

/// POST /transparency/resolutions - auditor only.
pub async fn resolve(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<Resolution>> {
    let auditor = require_role(&caller, PartyRole::Auditor)?;
    let resolution = state.transparency.resolve(
        &request.concern_id,
        auditor.party_id,
        request.outcome,
        request.notes,
    )?;
    Ok(Json(resolution))
}

/// GET /transparency/stats
pub async fn stats(State(state): State<AppState>) -> Json<LedgerStats> {
    Json(state.transparency.stats())
}
