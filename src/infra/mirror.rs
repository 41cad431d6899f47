//! Multi-party mirror simulation.
//!
//! Three fixed parties (lab, auditor, government) each hold a local snapshot
//! of the transparency record set plus a content hash captured at sync time.
//! Tampering with one copy leaves its stored hash stale, which `detect`
//! surfaces by recomputing hashes and diffing records across parties.
//!
//! This simulates replication for tamper-evidence only: no election, no log
//! shipping, no agreement under partitions.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::info;

use crate::crypto::{canonical_hash, canonical_json};
use crate::domain::{
    time, MirrorComparison, MirrorDetection, MirrorRecord, MirrorRecordType, MirrorSnapshot,
    MirrorStatus, MirrorSyncReport, MirrorTamperReport, PartyRole,
};

use super::error::{LedgerError, Result};
use super::store;
use super::transparency::TransparencyLedger;

/// Holds the three per-party snapshots. Divergence deliberately survives
/// restarts; only `sync_all` or `reset` repairs it.
pub struct MirrorSimulator {
    path: PathBuf,
    mirrors: RwLock<BTreeMap<PartyRole, MirrorSnapshot>>,
}

fn content_hash_of(records: &[MirrorRecord]) -> Result<String> {
    Ok(canonical_hash(&serde_json::to_value(records)?))
}

impl MirrorSimulator {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut mirrors: BTreeMap<PartyRole, MirrorSnapshot> =
            store::load_document(&path).unwrap_or_default();
        for party in PartyRole::all() {
            mirrors
                .entry(party)
                .or_insert_with(|| MirrorSnapshot::empty(party));
        }
        Self {
            path,
            mirrors: RwLock::new(mirrors),
        }
    }

    /// Rebuild every party's snapshot from the transparency store.
    pub fn sync_all(&self, ledger: &TransparencyLedger) -> Result<MirrorSyncReport> {
        let records = ledger.mirror_records();
        let content_hash = content_hash_of(&records)?;
        let synced_at = time::now();

        let mut mirrors = self.mirrors.write().unwrap();
        let before = mirrors.clone();
        for party in PartyRole::all() {
            mirrors.insert(
                party,
                MirrorSnapshot {
                    party,
                    records: records.clone(),
                    content_hash: content_hash.clone(),
                    last_synced_at: Some(synced_at),
                },
            );
        }
        if let Err(err) = store::save_document(&self.path, &*mirrors) {
            *mirrors = before;
            return Err(err);
        }

        info!(record_count = records.len(), "mirrors synced");
        Ok(MirrorSyncReport {
            synced_parties: PartyRole::all().to_vec(),
            record_count: records.len(),
            content_hash,
            synced_at,
        })
    }

    pub fn status(&self) -> Vec<MirrorStatus> {
        let mirrors = self.mirrors.read().unwrap();
        PartyRole::all()
            .iter()
            .filter_map(|party| mirrors.get(party))
            .map(|snapshot| MirrorStatus {
                party: snapshot.party,
                record_count: snapshot.records.len(),
                content_hash: snapshot.content_hash.clone(),
                last_synced_at: snapshot.last_synced_at,
            })
            .collect()
    }

    /// Compare stored content hashes: consistent iff all non-empty hashes
    /// are equal. Parties that never synced are not counted against
    /// consistency.
    pub fn compare(&self) -> MirrorComparison {
        let mirrors = self.mirrors.read().unwrap();
        let hashes: BTreeMap<PartyRole, &str> = mirrors
            .iter()
            .filter(|(_, s)| !s.content_hash.is_empty())
            .map(|(party, s)| (*party, s.content_hash.as_str()))
            .collect();

        let distinct: BTreeSet<&str> = hashes.values().copied().collect();
        if distinct.len() <= 1 {
            return MirrorComparison {
                consistent: true,
                divergent_parties: Vec::new(),
            };
        }

        let majority = majority_value(hashes.values().copied());
        let divergent_parties = hashes
            .iter()
            .filter(|(_, hash)| **hash != majority)
            .map(|(party, _)| *party)
            .collect();

        MirrorComparison {
            consistent: false,
            divergent_parties,
        }
    }

    /// Demo only: mutate one party's local copy WITHOUT refreshing its
    /// content hash. A missing record is injected instead.
    pub fn tamper(
        &self,
        party: PartyRole,
        record_type: MirrorRecordType,
        record_id: &str,
        field: &str,
        new_value: serde_json::Value,
    ) -> Result<MirrorTamperReport> {
        let mut mirrors = self.mirrors.write().unwrap();
        let before = mirrors.clone();
        let snapshot = mirrors
            .get_mut(&party)
            .ok_or_else(|| LedgerError::not_found("mirror", party.to_string()))?;

        let action = match snapshot
            .records
            .iter_mut()
            .find(|r| r.record_type == record_type && r.id == record_id)
        {
            Some(record) => {
                let data = record.data.as_object_mut().ok_or_else(|| {
                    LedgerError::Validation("mirror record is not an object".to_string())
                })?;
                data.insert(field.to_string(), new_value);
                "modified"
            }
            None => {
                let mut data = serde_json::Map::new();
                data.insert("id".to_string(), serde_json::Value::String(record_id.to_string()));
                data.insert(field.to_string(), new_value);
                snapshot.records.push(MirrorRecord {
                    record_type,
                    id: record_id.to_string(),
                    data: serde_json::Value::Object(data),
                });
                snapshot.records.sort_by(|a, b| a.id.cmp(&b.id));
                "injected"
            }
        };

        if let Err(err) = store::save_document(&self.path, &*mirrors) {
            *mirrors = before;
            return Err(err);
        }

        Ok(MirrorTamperReport {
            party,
            record_id: record_id.to_string(),
            action: action.to_string(),
        })
    }

    /// Recompute every party's content hash and diff records across parties.
    ///
    /// A party diverges when its stored hash no longer matches its records,
    /// or when its recomputed hash differs from the other parties'.
    pub fn detect(&self) -> Result<MirrorDetection> {
        let mirrors = self.mirrors.read().unwrap();

        let mut recomputed: BTreeMap<PartyRole, String> = BTreeMap::new();
        let mut divergent: BTreeSet<PartyRole> = BTreeSet::new();

        for (party, snapshot) in mirrors.iter() {
            let fresh = content_hash_of(&snapshot.records)?;
            if !snapshot.content_hash.is_empty() && snapshot.content_hash != fresh {
                divergent.insert(*party);
            }
            recomputed.insert(*party, fresh);
        }

        let distinct: BTreeSet<&str> = recomputed.values().map(String::as_str).collect();
        if distinct.len() > 1 {
            let majority = majority_value(recomputed.values().map(String::as_str));
            for (party, hash) in &recomputed {
                if hash != &majority {
                    divergent.insert(*party);
                }
            }
        }

        // Identify which records actually differ between parties.
        let mut affected: BTreeSet<String> = BTreeSet::new();
        if !divergent.is_empty() {
            let mut all_ids: BTreeSet<&str> = BTreeSet::new();
            for snapshot in mirrors.values() {
                all_ids.extend(snapshot.records.iter().map(|r| r.id.as_str()));
            }
            for id in all_ids {
                let renderings: BTreeSet<Option<String>> = mirrors
                    .values()
                    .map(|snapshot| {
                        snapshot
                            .records
                            .iter()
                            .find(|r| r.id == id)
                            .map(|r| canonical_json(&r.data))
                    })
                    .collect();
                if renderings.len() > 1 {
                    affected.insert(id.to_string());
                }
            }
        }

        Ok(MirrorDetection {
            tampering_detected: !divergent.is_empty(),
            divergent_parties: divergent.into_iter().collect(),
            affected_records: affected.into_iter().collect(),
        })
    }

    /// Demo only: clear all snapshots.
    pub fn reset(&self) -> Result<()> {
        let mut mirrors = self.mirrors.write().unwrap();
        let before = mirrors.clone();
        for party in PartyRole::all() {
            mirrors.insert(party, MirrorSnapshot::empty(party));
        }
        if let Err(err) = store::save_document(&self.path, &*mirrors) {
            *mirrors = before;
            return Err(err);
        }
        info!("mirrors reset");
        Ok(())
    }
}

/// Most frequent value in `values`; ties break toward the lexicographically
/// smallest so the result is deterministic.
fn majority_value<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256_hex;
    use crate::infra::audit_log::AuditLog;
    use crate::domain::TemplateType;
    use serde_json::json;
    use std::sync::Arc;

    fn fixtures(dir: &tempfile::TempDir) -> (MirrorSimulator, TransparencyLedger) {
        let audit = Arc::new(AuditLog::open(dir.path().join("audit_log.json")));
        let ledger = TransparencyLedger::open(dir.path().join("transparency.json"), audit);
        let mirrors = MirrorSimulator::open(dir.path().join("mirror_store.json"));
        (mirrors, ledger)
    }

    fn seed(ledger: &TransparencyLedger) -> String {
        ledger
            .submit_compliance(
                "party_lab",
                "dep-1",
                "model-1",
                TemplateType::SafetyEvaluation,
                "Safety eval",
                sha256_hex(b"evidence"),
            )
            .unwrap();
        ledger
            .raise_concern("anon_ab12cd34ef56", "Eval coverage", "Bio evals missing", "dep-1")
            .unwrap()
            .id
    }

    #[test]
    fn fresh_mirrors_are_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let (mirrors, _) = fixtures(&dir);

        assert!(mirrors.compare().consistent);
        let detection = mirrors.detect().unwrap();
        assert!(!detection.tampering_detected);
    }

    #[test]
    fn sync_makes_all_parties_agree() {
        let dir = tempfile::tempdir().unwrap();
        let (mirrors, ledger) = fixtures(&dir);
        seed(&ledger);

        let report = mirrors.sync_all(&ledger).unwrap();
        assert_eq!(report.record_count, 2);

        assert!(mirrors.compare().consistent);
        for status in mirrors.status() {
            assert_eq!(status.record_count, 2);
            assert_eq!(status.content_hash, report.content_hash);
        }
    }

    #[test]
    fn tampered_party_is_detected_with_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let (mirrors, ledger) = fixtures(&dir);
        let concern_id = seed(&ledger);
        mirrors.sync_all(&ledger).unwrap();

        let report = mirrors
            .tamper(
                PartyRole::Lab,
                MirrorRecordType::Concern,
                &concern_id,
                "title",
                json!("nothing to see here"),
            )
            .unwrap();
        assert_eq!(report.action, "modified");

        let detection = mirrors.detect().unwrap();
        assert!(detection.tampering_detected);
        assert_eq!(detection.divergent_parties, vec![PartyRole::Lab]);
        assert_eq!(detection.affected_records, vec![concern_id]);
    }

    #[test]
    fn tampering_an_unknown_record_injects_it() {
        let dir = tempfile::tempdir().unwrap();
        let (mirrors, ledger) = fixtures(&dir);
        seed(&ledger);
        mirrors.sync_all(&ledger).unwrap();

        let report = mirrors
            .tamper(
                PartyRole::Government,
                MirrorRecordType::Submission,
                "ghost-record",
                "title",
                json!("planted"),
            )
            .unwrap();
        assert_eq!(report.action, "injected");

        let detection = mirrors.detect().unwrap();
        assert_eq!(detection.divergent_parties, vec![PartyRole::Government]);
        assert!(detection
            .affected_records
            .contains(&"ghost-record".to_string()));
    }

    #[test]
    fn compare_flags_stored_hash_divergence_only_after_resync() {
        let dir = tempfile::tempdir().unwrap();
        let (mirrors, ledger) = fixtures(&dir);
        let concern_id = seed(&ledger);
        mirrors.sync_all(&ledger).unwrap();

        // Tampering leaves the stored hash untouched, so compare() still
        // agrees; detect() is what recomputes.
        mirrors
            .tamper(
                PartyRole::Auditor,
                MirrorRecordType::Concern,
                &concern_id,
                "status",
                json!("resolved"),
            )
            .unwrap();
        assert!(mirrors.compare().consistent);
        assert!(mirrors.detect().unwrap().tampering_detected);
    }

    #[test]
    fn divergence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror_store.json");
        let audit = Arc::new(AuditLog::open(dir.path().join("audit_log.json")));
        let ledger = TransparencyLedger::open(dir.path().join("transparency.json"), audit);
        let concern_id = seed(&ledger);

        {
            let mirrors = MirrorSimulator::open(&path);
            mirrors.sync_all(&ledger).unwrap();
            mirrors
                .tamper(
                    PartyRole::Lab,
                    MirrorRecordType::Concern,
                    &concern_id,
                    "title",
                    json!("rewritten"),
                )
                .unwrap();
        }

        let reopened = MirrorSimulator::open(&path);
        let detection = reopened.detect().unwrap();
        assert!(detection.tampering_detected);
        assert_eq!(detection.divergent_parties, vec![PartyRole::Lab]);
    }

    #[test]
    fn reset_clears_divergence() {
        let dir = tempfile::tempdir().unwrap();
        let (mirrors, ledger) = fixtures(&dir);
        let concern_id = seed(&ledger);
        mirrors.sync_all(&ledger).unwrap();
        mirrors
            .tamper(
                PartyRole::Lab,
                MirrorRecordType::Concern,
                &concern_id,
                "title",
                json!("rewritten"),
            )
            .unwrap();

        mirrors.reset().unwrap();
        assert!(!mirrors.detect().unwrap().tampering_detected);
        assert!(mirrors.status().iter().all(|s| s.record_count == 0));
    }
}
