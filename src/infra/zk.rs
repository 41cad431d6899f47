//! Commit-open threshold proofs over event counts.
//!
//! Deterministic SHA-256 commitments and proofs, verifiable but providing
//! no zero-knowledge guarantees against an adversarial committer: the
//! server mints commitments and therefore holds the witness. The interface
//! (`commit`, `prove`, `verify`) is the contract; a sound range-proof
//! system can replace the internals without touching callers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use rand::Rng;
use tracing::info;

use crate::crypto::sha256_hex;
use crate::domain::{time, ZkCommitment, ZkCommitmentRecord, ZkProof, ZkVerification};

use super::error::{LedgerError, Result};
use super::store;

/// Commitment store with witness retention (demo behavior; a production
/// prover keeps `count` and `blinding` client-side).
pub struct ZkEngine {
    path: PathBuf,
    commitments: RwLock<BTreeMap<String, ZkCommitmentRecord>>,
}

fn commitment_value(count: u64, blinding: &str) -> String {
    sha256_hex(format!("{count}:{blinding}").as_bytes())
}

fn proof_value(commitment: &str, threshold: u64, count: u64, blinding: &str) -> String {
    sha256_hex(format!("{commitment}:{threshold}:{count}:{blinding}").as_bytes())
}

fn claim(threshold: u64) -> String {
    format!("count >= {threshold}")
}

impl ZkEngine {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let commitments: BTreeMap<String, ZkCommitmentRecord> =
            store::load_document(&path).unwrap_or_default();
        if !commitments.is_empty() {
            info!(count = commitments.len(), path = %path.display(), "restored ZK commitments");
        }
        Self {
            path,
            commitments: RwLock::new(commitments),
        }
    }

    /// Commit to `count`. A fresh 32-byte blinding factor is generated when
    /// the caller does not supply one. The returned record carries the
    /// blinding; this is the only time it leaves the engine.
    pub fn commit(
        &self,
        count: u64,
        blinding: Option<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ZkCommitmentRecord> {
        let mut rng = rand::thread_rng();
        let blinding = match blinding {
            Some(blinding) if !blinding.is_empty() => blinding,
            Some(_) => {
                return Err(LedgerError::Validation(
                    "blinding must not be empty".to_string(),
                ));
            }
            None => hex::encode(rng.gen::<[u8; 32]>()),
        };

        let record = ZkCommitmentRecord {
            id: hex::encode(rng.gen::<[u8; 8]>()),
            commitment: commitment_value(count, &blinding),
            created_at: time::now(),
            metadata,
            count,
            blinding,
        };

        let mut commitments = self.commitments.write().unwrap();
        commitments.insert(record.id.clone(), record.clone());
        if let Err(err) = store::save_document(&self.path, &*commitments) {
            commitments.remove(&record.id);
            return Err(err);
        }

        Ok(record)
    }

    /// Public view of a commitment (no witness).
    pub fn get(&self, id: &str) -> Result<ZkCommitment> {
        self.commitments
            .read()
            .unwrap()
            .get(id)
            .map(ZkCommitmentRecord::to_public)
            .ok_or_else(|| LedgerError::not_found("commitment", id))
    }

    /// Produce a threshold proof. Fails with a precondition error when the
    /// committed count does not meet the threshold.
    pub fn prove(&self, commitment_id: &str, threshold: u64) -> Result<ZkProof> {
        let commitments = self.commitments.read().unwrap();
        let record = commitments
            .get(commitment_id)
            .ok_or_else(|| LedgerError::not_found("commitment", commitment_id))?;

        if record.count < threshold {
            return Err(LedgerError::Precondition(format!(
                "committed count does not meet threshold {threshold}"
            )));
        }

        Ok(ZkProof {
            commitment_id: record.id.clone(),
            threshold,
            proof_value: proof_value(&record.commitment, threshold, record.count, &record.blinding),
            claim: claim(threshold),
            created_at: time::now(),
        })
    }

    /// Verify a proof against the stored witness: the verdict is equality of
    /// the recomputed proof value, and the threshold actually holding.
    pub fn verify(
        &self,
        commitment_id: &str,
        threshold: u64,
        supplied_proof: &str,
    ) -> Result<ZkVerification> {
        let commitments = self.commitments.read().unwrap();
        let record = commitments
            .get(commitment_id)
            .ok_or_else(|| LedgerError::not_found("commitment", commitment_id))?;

        let expected = proof_value(&record.commitment, threshold, record.count, &record.blinding);
        let valid = record.count >= threshold && supplied_proof == expected;

        Ok(ZkVerification {
            valid,
            claim: claim(threshold),
        })
    }

    /// Demo only: drop all commitments.
    pub fn reset(&self) -> Result<()> {
        let mut commitments = self.commitments.write().unwrap();
        let before = std::mem::take(&mut *commitments);
        if let Err(err) = store::save_document(&self.path, &*commitments) {
            *commitments = before;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn open_engine(dir: &tempfile::TempDir) -> ZkEngine {
        ZkEngine::open(dir.path().join("zk_store.json"))
    }

    #[test]
    fn commitment_binds_count_and_blinding() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let record = engine.commit(7, None, Map::new()).unwrap();
        assert_eq!(record.blinding.len(), 64);
        assert_eq!(
            record.commitment,
            sha256_hex(format!("7:{}", record.blinding).as_bytes())
        );
    }

    #[test]
    fn proof_verifies_when_threshold_met() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let record = engine.commit(7, None, Map::new()).unwrap();
        let proof = engine.prove(&record.id, 5).unwrap();
        assert_eq!(proof.claim, "count >= 5");

        let verdict = engine.verify(&record.id, 5, &proof.proof_value).unwrap();
        assert!(verdict.valid);
    }

    #[test]
    fn proof_generation_fails_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let record = engine.commit(3, None, Map::new()).unwrap();
        let err = engine.prove(&record.id, 5).unwrap_err();
        assert!(matches!(err, LedgerError::Precondition(_)));
    }

    #[test]
    fn forged_proof_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let record = engine.commit(7, None, Map::new()).unwrap();
        let verdict = engine
            .verify(&record.id, 5, &sha256_hex(b"forged proof"))
            .unwrap();
        assert!(!verdict.valid);
    }

    #[test]
    fn proof_is_bound_to_its_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let record = engine.commit(10, None, Map::new()).unwrap();
        let proof = engine.prove(&record.id, 5).unwrap();

        // The same proof value does not demonstrate a different threshold.
        let verdict = engine.verify(&record.id, 6, &proof.proof_value).unwrap();
        assert!(!verdict.valid);
    }

    #[test]
    fn caller_supplied_blinding_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let blinding = "ab".repeat(32);
        let record = engine.commit(4, Some(blinding.clone()), Map::new()).unwrap();
        assert_eq!(record.blinding, blinding);
        assert_eq!(
            record.commitment,
            sha256_hex(format!("4:{blinding}").as_bytes())
        );
    }

    #[test]
    fn public_view_omits_the_witness() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        let record = engine.commit(7, None, Map::new()).unwrap();
        let public = engine.get(&record.id).unwrap();
        let rendered = serde_json::to_string(&public).unwrap();
        assert!(!rendered.contains(&record.blinding));
        assert!(!rendered.contains("count"));
    }

    #[test]
    fn unknown_commitment_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(&dir);

        assert!(matches!(
            engine.prove("missing", 1),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn commitments_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zk_store.json");

        let (id, proof_value) = {
            let engine = ZkEngine::open(&path);
            let record = engine.commit(9, None, Map::new()).unwrap();
            let proof = engine.prove(&record.id, 9).unwrap();
            (record.id, proof.proof_value)
        };

        let reopened = ZkEngine::open(&path);
        let verdict = reopened.verify(&id, 9, &proof_value).unwrap();
        assert!(verdict.valid);
    }
}
