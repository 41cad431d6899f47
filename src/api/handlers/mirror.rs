//! Mirror simulation endpoints (demo surface).

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::domain::{
    MirrorComparison, MirrorDetection, MirrorRecordType, MirrorStatus, MirrorSyncReport,
    MirrorTamperReport, PartyRole,
};
use crate::server::AppState;

/// POST /demo/mirror/sync - snapshot the transparency store into every
/// party's mirror.
pub async fn sync(State(state): State<AppState>) -> ApiResult<Json<MirrorSyncReport>> {
    Ok(Json(state.mirrors.sync_all(&state.transparency)?))
}

/// GET /demo/mirror/status
pub async fn status(State(state): State<AppState>) -> Json<Vec<MirrorStatus>> {
    Json(state.mirrors.status())
}

/// GET /demo/mirror/compare - stored-hash agreement across parties.
pub async fn compare(State(state): State<AppState>) -> Json<MirrorComparison> {
    Json(state.mirrors.compare())
}

#[derive(Debug, Deserialize)]
pub struct MirrorTamperRequest {
    pub party: PartyRole,
    pub record_type: MirrorRecordType,
    pub record_id: String,
    pub field: String,
    pub new_value: serde_json::Value,
}

/// POST /demo/mirror/tamper - mutate one party's copy without refreshing
/// its content hash.
pub async fn tamper(
    State(state): State<AppState>,
    Json(request): Json<MirrorTamperRequest>,
) -> ApiResult<Json<MirrorTamperReport>> {
    Ok(Json(state.mirrors.tamper(
        request.party,
        request.record_type,
        &request.record_id,
        &request.field,
        request.new_value,
    )?))
}

/// GET /demo/mirror/detect - recompute hashes and report divergence. A
/// divergent mirror is a finding, not an error; the response is always 200.
pub async fn detect(State(state): State<AppState>) -> ApiResult<Json<MirrorDetection>> {
    Ok(Json(state.mirrors.detect()?))
}

/// POST /demo/mirror/reset
pub async fn reset(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.mirrors.reset()?;
    Ok(Json(serde_json::json!({ "message": "all mirrors reset" })))
}
