//! Deterministic hashing over canonical JSON.
//!
//! Every verification property of the ledger (chain integrity, Merkle
//! inclusion, mirror agreement) reduces to byte-for-byte agreement on the
//! serialized form, so all hashing goes through RFC 8785 (JCS)
//! canonicalization:
//! - keys sorted lexicographically at every depth
//! - compact separators, no insignificant whitespace
//! - ES6-compatible number rendering
//!
//! Hashes are rendered as lowercase hex SHA-256 (64 chars) everywhere.

use sha2::{Digest, Sha256};

/// `previous_hash` of the genesis event.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Number of hex characters in a SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 over raw bytes, rendered as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert a JSON value to its canonical string representation per RFC 8785.
///
/// # Panics
///
/// Panics if the value contains a float that cannot be represented (NaN or
/// Infinity). Per RFC 8785 these are not valid JSON; none of the ledger's
/// own types can produce them.
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json_canonicalizer::to_string(value)
        .expect("failed to canonicalize JSON: contains NaN or Infinity")
}

/// Canonical hash: `SHA256(canonical_json(value))`.
pub fn canonical_hash(value: &serde_json::Value) -> String {
    sha256_hex(canonical_json(value).as_bytes())
}

/// Chain hash: `SHA256(canonical_json(data) || previous_hash)` with the
/// previous hash appended as ASCII hex.
///
/// Links each audit event to its predecessor; any edit to `data` or to the
/// link breaks every later hash in the chain.
pub fn chain_hash(data: &serde_json::Value, previous_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(data).as_bytes());
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// Merkle node hash: `SHA256(left || right)` over the ASCII hex digests.
pub fn node_hash(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive an anonymous but stable pseudonym from a client-held identity and
/// salt: `anon_` followed by the first 12 hex chars of
/// `SHA256(identity || "||" || salt)`.
///
/// The inputs never leave this function; the server stores only the derived
/// ID.
pub fn anonymous_id(identity: &str, salt: &str) -> String {
    let digest = sha256_hex(format!("{identity}||{salt}").as_bytes());
    format!("anon_{}", &digest[..12])
}

/// Check that an identity/salt pair matches a previously derived anonymous
/// ID. Lets a whistleblower prove ownership of a pseudonym to an auditor
/// without the server ever holding the identity.
pub fn verify_anonymous_id(identity: &str, salt: &str, anon_id: &str) -> bool {
    anonymous_id(identity, salt) == anon_id
}

/// Validate a lowercase hex SHA-256 digest (64 chars).
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
