//! Merkle tree over the audit log's event hashes.
//!
//! Levels pair adjacent nodes with `node_hash`; an odd level duplicates its
//! last node before combining. Proof steps carry the sibling hash and the
//! side the SIBLING sits on, so verification folds left/right accordingly.
//!
//! The tree hashes ASCII-hex digests, not raw bytes, to stay bit-compatible
//! with the other parties' implementations.

use serde::{Deserialize, Serialize};

use crate::crypto::node_hash;

use super::error::{LedgerError, Result};

/// Side of the sibling in a proof step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

/// One step of an inclusion proof, leaf to root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling_hash: String,
    pub position: Position,
}

/// A fully materialized Merkle tree. Rebuilt on demand from the current
/// leaf set; no incremental maintenance.
pub struct MerkleTree {
    /// `levels[0]` are the leaves; the last level holds the root.
    levels: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Build a tree from ordered leaf hashes. Zero leaves yield an empty
    /// tree; one leaf is its own root.
    pub fn build(leaves: &[String]) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves.to_vec()];
        while levels.last().map(Vec::len).unwrap_or(0) > 1 {
            let current = &levels[levels.len() - 1];
            let mut next = Vec::with_capacity((current.len() + 1) / 2);
            for pair in current.chunks(2) {
                let left = &pair[0];
                // Odd level: the last node pairs with itself.
                let right = pair.get(1).unwrap_or(left);
                next.push(node_hash(left, right));
            }
            levels.push(next);
        }

        Self { levels }
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn root(&self) -> Option<&str> {
        self.levels
            .last()
            .and_then(|level| level.first())
            .map(String::as_str)
    }

    /// Inclusion proof for the leaf at `index`, ordered leaf to root.
    pub fn prove(&self, index: usize) -> Result<Vec<ProofStep>> {
        if index >= self.leaf_count() {
            return Err(LedgerError::not_found("leaf", index.to_string()));
        }

        let mut proof = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let step = if idx % 2 == 0 {
                // Duplicated odd node proves against itself.
                let sibling = level.get(idx + 1).unwrap_or(&level[idx]);
                ProofStep {
                    sibling_hash: sibling.clone(),
                    position: Position::Right,
                }
            } else {
                ProofStep {
                    sibling_hash: level[idx - 1].clone(),
                    position: Position::Left,
                }
            };
            proof.push(step);
            idx /= 2;
        }

        Ok(proof)
    }
}

/// Fold a proof from `leaf_hash` and compare against `root`.
pub fn verify_proof(leaf_hash: &str, proof: &[ProofStep], root: &str) -> bool {
    let mut acc = leaf_hash.to_string();
    for step in proof {
        acc = match step.position {
            Position::Left => node_hash(&step.sibling_hash, &acc),
            Position::Right => node_hash(&acc, &step.sibling_hash),
        };
    }
    acc == root
}
