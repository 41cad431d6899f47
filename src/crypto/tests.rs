//! Unit tests for the hashing primitives.

use super::*;
use serde_json::json;

#[test]
fn canonical_json_sorts_keys_at_every_depth() {
    let value = json!({
        "z": 1,
        "a": { "y": 2, "b": 3 },
        "m": [ { "k": 1, "a": 2 } ]
    });

    assert_eq!(
        canonical_json(&value),
        r#"{"a":{"b":3,"y":2},"m":[{"a":2,"k":1}],"z":1}"#
    );
}

#[test]
fn canonical_hash_is_key_order_independent() {
    let a = json!({ "x": 1, "y": "two", "z": [1, 2, 3] });
    let b = json!({ "z": [1, 2, 3], "x": 1, "y": "two" });

    assert_eq!(canonical_hash(&a), canonical_hash(&b));
}

#[test]
fn canonical_hash_is_64_lowercase_hex() {
    let digest = canonical_hash(&json!({ "k": "v" }));
    assert!(is_sha256_hex(&digest));
}

#[test]
fn chain_hash_depends_on_previous_hash() {
    let data = json!({ "id": 0, "description": "training run" });

    let genesis = chain_hash(&data, GENESIS_HASH);
    let linked = chain_hash(&data, &sha256_hex(b"some earlier event"));

    assert_ne!(genesis, linked);
    assert_eq!(genesis, chain_hash(&data, GENESIS_HASH));
}

#[test]
fn node_hash_is_order_sensitive() {
    let left = sha256_hex(b"left");
    let right = sha256_hex(b"right");

    assert_ne!(node_hash(&left, &right), node_hash(&right, &left));
}

#[test]
fn node_hash_matches_ascii_concatenation() {
    let left = sha256_hex(b"l");
    let right = sha256_hex(b"r");
    let expected = sha256_hex(format!("{left}{right}").as_bytes());

    assert_eq!(node_hash(&left, &right), expected);
}

#[test]
fn anonymous_id_is_deterministic_and_short() {
    let id = anonymous_id("researcher@example.com", "hunter2hunter2");

    assert!(id.starts_with("anon_"));
    assert_eq!(id.len(), "anon_".len() + 12);
    assert_eq!(id, anonymous_id("researcher@example.com", "hunter2hunter2"));
}

#[test]
fn anonymous_id_changes_with_salt() {
    let a = anonymous_id("researcher@example.com", "salt-one");
    let b = anonymous_id("researcher@example.com", "salt-two");
    assert_ne!(a, b);
}

#[test]
fn verify_anonymous_id_round_trip() {
    let id = anonymous_id("insider@lab.example", "s3cret-salt");

    assert!(verify_anonymous_id("insider@lab.example", "s3cret-salt", &id));
    assert!(!verify_anonymous_id("insider@lab.example", "wrong-salt", &id));
}

#[test]
fn is_sha256_hex_rejects_bad_digests() {
    assert!(is_sha256_hex(GENESIS_HASH));
    assert!(!is_sha256_hex("abc123"));
    assert!(!is_sha256_hex(&"A".repeat(64)));
    assert!(!is_sha256_hex(&"g".repeat(64)));
}
