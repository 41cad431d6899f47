//! Audit-log endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::domain::{Event, EventType, LedgerStatus, VerificationReport};
use crate::infra::MerkleTree;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub event_type: EventType,
    pub description: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// POST /events - append an event to the chain.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<Json<Event>> {
    let event = state
        .audit_log
        .append(request.event_type, request.description, request.metadata)?;
    Ok(Json(event))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub event_type: Option<EventType>,
    pub limit: Option<usize>,
}

/// GET /events - list events, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<Event>> {
    Json(state.audit_log.list(query.event_type, query.limit))
}

/// GET /events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Event>> {
    Ok(Json(state.audit_log.get(id)?))
}

/// GET /status - event count, chain head and Merkle root.
pub async fn get_status(State(state): State<AppState>) -> Json<LedgerStatus> {
    let hashes = state.audit_log.event_hashes();
    let tree = MerkleTree::build(&hashes);
    Json(LedgerStatus {
        event_count: hashes.len(),
        last_hash: state.audit_log.latest_hash(),
        merkle_root: tree.root().map(str::to_string),
        chain_valid: state.audit_log.verify_chain().valid,
    })
}

/// GET /verify - full chain verification. An invalid chain is a finding,
/// not an error; the response is always 200.
pub async fn verify_chain(State(state): State<AppState>) -> Json<VerificationReport> {
    Json(state.audit_log.verify_chain())
}
