//! Merkle inclusion-proof endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::infra::{verify_proof, MerkleTree, ProofStep};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ProofResponse {
    pub event_id: u64,
    pub event_hash: String,
    pub merkle_root: String,
    pub proof: Vec<ProofStep>,
    pub valid: bool,
}

/// GET /proof/:id - inclusion proof for one event against the current root.
pub async fn get_proof(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ProofResponse>> {
    let event = state.audit_log.get(id)?;
    let tree = MerkleTree::build(&state.audit_log.event_hashes());
    let proof = tree.prove(id as usize)?;
    let merkle_root = tree.root().unwrap_or_default().to_string();
    let valid = verify_proof(&event.hash, &proof, &merkle_root);

    Ok(Json(ProofResponse {
        event_id: event.id,
        event_hash: event.hash,
        merkle_root,
        proof,
        valid,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyProofRequest {
    pub leaf_hash: String,
    pub proof: Vec<ProofStep>,
    pub root: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyProofResponse {
    pub valid: bool,
}

/// POST /proof/verify - fold a proof and compare against the claimed root.
pub async fn verify_inclusion(
    Json(request): Json<VerifyProofRequest>,
) -> Json<VerifyProofResponse> {
    Json(VerifyProofResponse {
        valid: verify_proof(&request.leaf_hash, &request.proof, &request.root),
    })
}
