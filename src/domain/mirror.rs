//! Per-party snapshots of the transparency store.
//!
//! A mirror is one party's local copy of the canonical record set plus a
//! content hash over its canonical JSON. Agreement is checked purely by hash
//! comparison; this simulates replication for tamper-evidence, not consensus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time;
use super::PartyRole;

/// Record kinds carried in a mirror snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorRecordType {
    Concern,
    Submission,
}

/// One replicated record: the canonical JSON form of a concern or
/// compliance submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorRecord {
    pub record_type: MirrorRecordType,
    pub id: String,
    pub data: serde_json::Value,
}

/// One party's local copy of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    pub party: PartyRole,
    pub records: Vec<MirrorRecord>,
    /// SHA-256 over the canonical JSON of `records` as captured at the last
    /// sync. Empty until the first sync. Deliberately NOT recomputed on
    /// mutation, so local tampering is observable.
    pub content_hash: String,
    #[serde(
        with = "time::ts_seconds_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl MirrorSnapshot {
    pub fn empty(party: PartyRole) -> Self {
        Self {
            party,
            records: Vec::new(),
            content_hash: String::new(),
            last_synced_at: None,
        }
    }
}

/// Per-party summary for `GET /demo/mirror/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorStatus {
    pub party: PartyRole,
    pub record_count: usize,
    pub content_hash: String,
    #[serde(
        with = "time::ts_seconds_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Result of `sync_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSyncReport {
    pub synced_parties: Vec<PartyRole>,
    pub record_count: usize,
    pub content_hash: String,
    #[serde(with = "time::ts_seconds")]
    pub synced_at: DateTime<Utc>,
}

/// Result of `compare`: consistent iff all non-empty content hashes agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorComparison {
    pub consistent: bool,
    pub divergent_parties: Vec<PartyRole>,
}

/// Result of a demo tamper operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorTamperReport {
    pub party: PartyRole,
    pub record_id: String,
    /// `"modified"` when the record existed, `"injected"` when it did not.
    pub action: String,
}

/// Result of `detect`: recomputed-hash divergence with the records that
/// differ across parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorDetection {
    pub tampering_detected: bool,
    pub divergent_parties: Vec<PartyRole>,
    /// Ids of records whose canonical value differs between parties.
    pub affected_records: Vec<String>,
}
