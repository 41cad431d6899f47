//! Threshold commitments and proofs over event counts.
//!
//! A commitment binds a hidden count with a random blinding factor; a proof
//! demonstrates `count >= threshold` to a verifier holding only the
//! commitment. This is an auditor-trust-in-the-ledger scheme: the server
//! retains the witness because it also mints the commitments, so it
//! demonstrates the interface, not soundness against an adversarial
//! committer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time;

/// Public view of a commitment, safe to hand to verifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZkCommitment {
    pub id: String,
    /// `SHA256(str(count) || ":" || blinding)`, lowercase hex.
    pub commitment: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Stored commitment including the witness.
///
/// `count` and `blinding` stay server-side only because commitments are
/// server-generated in this deployment; a production prover keeps the witness
/// client-side and the server stores nothing but `commitment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZkCommitmentRecord {
    pub id: String,
    pub commitment: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub count: u64,
    /// 32 random bytes, hex-encoded. Returned to the caller once at creation.
    pub blinding: String,
}

impl ZkCommitmentRecord {
    pub fn to_public(&self) -> ZkCommitment {
        ZkCommitment {
            id: self.id.clone(),
            commitment: self.commitment.clone(),
            created_at: self.created_at,
            metadata: self.metadata.clone(),
        }
    }
}

/// A threshold proof bound to a commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZkProof {
    pub commitment_id: String,
    pub threshold: u64,
    /// `SHA256(commitment || ":" || threshold || ":" || count || ":" || blinding)`.
    pub proof_value: String,
    /// The claim this proof demonstrates, e.g. `"count >= 5"`.
    pub claim: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// Verifier verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZkVerification {
    pub valid: bool,
    pub claim: String,
}
