//! Threshold commitment and proof endpoints.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::domain::{time, ZkCommitment, ZkProof, ZkVerification};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommitmentRequest {
    pub count: u64,
    /// Optional caller-supplied blinding factor; generated when omitted.
    pub blinding: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Commitment as returned at creation: the only response that ever carries
/// the blinding factor.
#[derive(Debug, Serialize)]
pub struct CommitmentIssued {
    pub id: String,
    pub commitment: String,
    pub blinding: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// POST /zk/commitment
pub async fn create_commitment(
    State(state): State<AppState>,
    Json(request): Json<CreateCommitmentRequest>,
) -> ApiResult<Json<CommitmentIssued>> {
    let record = state
        .zk
        .commit(request.count, request.blinding, request.metadata)?;
    Ok(Json(CommitmentIssued {
        id: record.id,
        commitment: record.commitment,
        blinding: record.blinding,
        created_at: record.created_at,
        metadata: record.metadata,
    }))
}

/// GET /zk/commitment/:id - public view, no witness.
pub async fn get_commitment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ZkCommitment>> {
    Ok(Json(state.zk.get(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct ProveRequest {
    pub commitment_id: String,
    pub threshold: u64,
}

/// POST /zk/prove - fails with a precondition error when the committed
/// count is below the threshold.
pub async fn prove(
    State(state): State<AppState>,
    Json(request): Json<ProveRequest>,
) -> ApiResult<Json<ZkProof>> {
    Ok(Json(state.zk.prove(&request.commitment_id, request.threshold)?))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub commitment_id: String,
    pub threshold: u64,
    pub proof_value: String,
}

/// POST /zk/verify
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<ZkVerification>> {
    Ok(Json(state.zk.verify(
        &request.commitment_id,
        request.threshold,
        &request.proof_value,
    )?))
}
