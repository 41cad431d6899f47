//! Property-based tests for the hashing and Merkle invariants.
//!
//! These verify the cross-party agreement properties: canonical hashing is
//! deterministic and key-order independent, chains bind their predecessors,
//! and every leaf of every tree shape proves inclusion.

use proptest::prelude::*;
use serde_json::json;

use transparency_ledger::crypto::{
    anonymous_id, canonical_hash, canonical_json, chain_hash, is_sha256_hex, node_hash,
    sha256_hex, GENESIS_HASH,
};
use transparency_ledger::infra::{verify_proof, MerkleTree};

// ============================================================================
// Custom Strategies
// ============================================================================

/// Generate a JSON payload of modest depth.
fn arb_payload() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(json!({})),
        (any::<i64>(), "[a-zA-Z0-9 ]{0,24}")
            .prop_map(|(n, s)| json!({ "number": n, "string": s })),
        any::<i64>().prop_map(|n| json!({ "outer": { "inner": { "value": n } } })),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(|v| json!({ "items": v })),
    ]
}

/// Generate a list of leaf hashes.
fn arb_leaves() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(any::<u64>(), 1..24)
        .prop_map(|seeds| seeds.iter().map(|s| sha256_hex(&s.to_be_bytes())).collect())
}

// ============================================================================
// Canonical hashing properties
// ============================================================================

proptest! {
    /// Canonical hashing is deterministic.
    #[test]
    fn canonical_hash_is_deterministic(payload in arb_payload()) {
        prop_assert_eq!(canonical_hash(&payload), canonical_hash(&payload));
    }

    /// Key order never affects the canonical form.
    #[test]
    fn canonical_hash_ignores_key_order(a in any::<i64>(), b in any::<i64>(), c in any::<i64>()) {
        let h1 = canonical_hash(&json!({ "a": a, "b": b, "c": c }));
        let h2 = canonical_hash(&json!({ "c": c, "a": a, "b": b }));
        prop_assert_eq!(h1, h2);
    }

    /// Canonical output is compact and sorted, so re-canonicalizing a parsed
    /// canonical string is the identity.
    #[test]
    fn canonicalization_is_idempotent(payload in arb_payload()) {
        let first = canonical_json(&payload);
        let reparsed: serde_json::Value = serde_json::from_str(&first).unwrap();
        prop_assert_eq!(first, canonical_json(&reparsed));
    }

    /// Every digest renders as 64 lowercase hex chars.
    #[test]
    fn digests_are_lowercase_hex(payload in arb_payload()) {
        prop_assert!(is_sha256_hex(&canonical_hash(&payload)));
    }

    /// A chain hash binds its predecessor: different previous hashes give
    /// different chain hashes.
    #[test]
    fn chain_hash_binds_previous(payload in arb_payload(), seed in any::<u64>()) {
        let other = sha256_hex(&seed.to_be_bytes());
        prop_assume!(other != GENESIS_HASH);
        prop_assert_ne!(
            chain_hash(&payload, GENESIS_HASH),
            chain_hash(&payload, &other)
        );
    }

    /// Anonymous IDs are deterministic, prefixed and short.
    #[test]
    fn anonymous_ids_are_stable(identity in ".{1,40}", salt in ".{8,40}") {
        let id = anonymous_id(&identity, &salt);
        prop_assert_eq!(id.clone(), anonymous_id(&identity, &salt));
        prop_assert!(id.starts_with("anon_"));
        prop_assert_eq!(id.len(), 17);
    }
}

// ============================================================================
// Merkle properties
// ============================================================================

proptest! {
    /// Every leaf of every tree size verifies against the root.
    #[test]
    fn all_leaves_prove_inclusion(leaves in arb_leaves()) {
        let tree = MerkleTree::build(&leaves);
        let root = tree.root().unwrap();

        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.prove(i).unwrap();
            prop_assert!(verify_proof(leaf, &proof, root));
        }
    }

    /// Proof length is logarithmic in the leaf count.
    #[test]
    fn proof_length_is_logarithmic(leaves in arb_leaves()) {
        let tree = MerkleTree::build(&leaves);
        let expected = if leaves.len() == 1 {
            0
        } else {
            (leaves.len() as f64).log2().ceil() as usize
        };

        for i in 0..leaves.len() {
            prop_assert_eq!(tree.prove(i).unwrap().len(), expected);
        }
    }

    /// A proof does not verify a different leaf.
    #[test]
    fn proofs_are_leaf_specific(leaves in arb_leaves(), seed in any::<u64>()) {
        let tree = MerkleTree::build(&leaves);
        let root = tree.root().unwrap();
        let proof = tree.prove(0).unwrap();

        let forged = sha256_hex(&seed.to_be_bytes());
        prop_assume!(forged != leaves[0]);
        // With a single leaf the proof is empty and the forged leaf IS the
        // claimed root comparison, which must still fail.
        prop_assert!(!verify_proof(&forged, &proof, root));
    }

    /// Changing any leaf changes the root.
    #[test]
    fn root_commits_to_every_leaf(leaves in arb_leaves(), index in any::<prop::sample::Index>(), seed in any::<u64>()) {
        let tree = MerkleTree::build(&leaves);
        let root = tree.root().unwrap().to_string();

        let i = index.index(leaves.len());
        let mut mutated = leaves.clone();
        mutated[i] = sha256_hex(&seed.to_be_bytes());
        prop_assume!(mutated[i] != leaves[i]);

        let mutated_tree = MerkleTree::build(&mutated);
        prop_assert_ne!(mutated_tree.root().unwrap(), root.as_str());
    }

    /// `node_hash` agrees with hashing the ASCII concatenation, the form the
    /// other parties compute.
    #[test]
    fn node_hash_matches_concatenation(a in any::<u64>(), b in any::<u64>()) {
        let left = sha256_hex(&a.to_be_bytes());
        let right = sha256_hex(&b.to_be_bytes());
        prop_assert_eq!(
            node_hash(&left, &right),
            sha256_hex(format!("{left}{right}").as_bytes())
        );
    }
}
