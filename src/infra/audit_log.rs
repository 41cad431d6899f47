//! Append-only audit log with a hash chain.
//!
//! Each event's hash commits to its own fields and to the previous event's
//! hash, so any retroactive edit is detectable by `verify_chain`. The log is
//! the leaf source for the Merkle inclusion-proof service.

use std::path::PathBuf;
use std::sync::RwLock;

use tracing::{debug, info};

use crate::crypto::GENESIS_HASH;
use crate::domain::{time, Event, EventType, VerificationReport};

use super::error::{LedgerError, Result};
use super::store;

/// The append-only, hash-chained event log.
///
/// Mutations are serialized under a writer lock and persisted as one
/// canonical JSON document; a failed persist rolls the in-memory append back.
pub struct AuditLog {
    path: PathBuf,
    events: RwLock<Vec<Event>>,
}

impl AuditLog {
    /// Open the log at `path`, restoring any persisted events ordered by id.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut events: Vec<Event> = store::load_document(&path).unwrap_or_default();
        events.sort_by_key(|e| e.id);
        if !events.is_empty() {
            info!(count = events.len(), path = %path.display(), "restored audit log");
        }
        Self {
            path,
            events: RwLock::new(events),
        }
    }

    /// Append a new event, chaining it to the current head.
    pub fn append(
        &self,
        event_type: EventType,
        description: impl Into<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Event> {
        let description = description.into();
        if description.is_empty() {
            return Err(LedgerError::Validation(
                "event description must not be empty".to_string(),
            ));
        }

        let mut events = self.events.write().unwrap();

        let previous_hash = events
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut event = Event {
            id: events.len() as u64,
            event_type,
            description,
            metadata,
            timestamp: time::now(),
            previous_hash,
            hash: String::new(),
        };
        event.hash = event.expected_hash();

        events.push(event.clone());
        if let Err(err) = store::save_document(&self.path, &*events) {
            events.pop();
            return Err(err);
        }

        debug!(id = event.id, event_type = %event.event_type, "audit event appended");
        Ok(event)
    }

    /// List events, newest first, optionally filtered by type and truncated.
    pub fn list(&self, event_type: Option<EventType>, limit: Option<usize>) -> Vec<Event> {
        let events = self.events.read().unwrap();
        let mut out: Vec<Event> = events
            .iter()
            .filter(|e| event_type.map_or(true, |t| e.event_type == t))
            .rev()
            .cloned()
            .collect();
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        out
    }

    pub fn get(&self, id: u64) -> Result<Event> {
        self.events
            .read()
            .unwrap()
            .get(id as usize)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("event", id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().unwrap().is_empty()
    }

    /// Hash of the most recent event, if any.
    pub fn latest_hash(&self) -> Option<String> {
        self.events.read().unwrap().last().map(|e| e.hash.clone())
    }

    /// Event hashes in id order: the Merkle leaf set.
    pub fn event_hashes(&self) -> Vec<String> {
        self.events
            .read()
            .unwrap()
            .iter()
            .map(|e| e.hash.clone())
            .collect()
    }

    /// Walk the chain and report the earliest inconsistency, if any.
    ///
    /// Checks, per event: the genesis link is all zeros, `previous_hash`
    /// equals the predecessor's stored hash, and the stored hash matches the
    /// recomputed chain hash.
    pub fn verify_chain(&self) -> VerificationReport {
        let events = self.events.read().unwrap();

        for (index, event) in events.iter().enumerate() {
            let expected_previous = if index == 0 {
                GENESIS_HASH.to_string()
            } else {
                events[index - 1].hash.clone()
            };

            if event.previous_hash != expected_previous {
                return VerificationReport::invalid(
                    index + 1,
                    event.id,
                    format!("event {}: previous hash mismatch", event.id),
                );
            }

            if event.hash != event.expected_hash() {
                return VerificationReport::invalid(
                    index + 1,
                    event.id,
                    format!("event {}: hash does not match recorded data", event.id),
                );
            }
        }

        VerificationReport::valid(events.len())
    }

    /// Demo only: empty the log.
    pub fn reset(&self) -> Result<()> {
        let mut events = self.events.write().unwrap();
        let before = std::mem::take(&mut *events);
        if let Err(err) = store::save_document(&self.path, &*events) {
            *events = before;
            return Err(err);
        }
        info!("audit log reset");
        Ok(())
    }

    /// Demo only: mutate a stored field WITHOUT recomputing the hash, to
    /// prove that `verify_chain` catches it.
    pub fn tamper(&self, id: u64, field: &str, new_value: serde_json::Value) -> Result<Event> {
        let mut events = self.events.write().unwrap();
        let index = id as usize;
        if index >= events.len() {
            return Err(LedgerError::not_found("event", id.to_string()));
        }

        let before = events[index].clone();
        let event = &mut events[index];
        match field {
            "description" => {
                let value = new_value.as_str().ok_or_else(|| {
                    LedgerError::Validation("description must be a string".to_string())
                })?;
                event.description = value.to_string();
            }
            "metadata" => {
                let value = new_value.as_object().ok_or_else(|| {
                    LedgerError::Validation("metadata must be an object".to_string())
                })?;
                event.metadata = value.clone();
            }
            "event_type" => {
                event.event_type = serde_json::from_value(new_value)
                    .map_err(|_| LedgerError::Validation("unknown event type".to_string()))?;
            }
            other => {
                return Err(LedgerError::Validation(format!(
                    "field not tamperable: {other}"
                )));
            }
        }

        let tampered = events[index].clone();
        if let Err(err) = store::save_document(&self.path, &*events) {
            events[index] = before;
            return Err(err);
        }
        Ok(tampered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_log(dir: &tempfile::TempDir) -> AuditLog {
        AuditLog::open(dir.path().join("audit_log.json"))
    }

    fn meta(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn genesis_event_links_to_zeros() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);

        let event = log
            .append(EventType::TrainingStarted, "run 1 kicked off", meta(json!({})))
            .unwrap();

        assert_eq!(event.id, 0);
        assert_eq!(event.previous_hash, GENESIS_HASH);
        assert_eq!(event.hash, event.expected_hash());
    }

    #[test]
    fn appends_chain_to_predecessor() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);

        let first = log
            .append(EventType::SafetyEvalRun, "eval batch", meta(json!({})))
            .unwrap();
        let second = log
            .append(EventType::SafetyEvalPassed, "eval passed", meta(json!({})))
            .unwrap();

        assert_eq!(second.id, 1);
        assert_eq!(second.previous_hash, first.hash);
        assert!(log.verify_chain().valid);
    }

    #[test]
    fn list_filters_and_limits_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);

        for i in 0..3 {
            log.append(EventType::SafetyEvalRun, format!("eval {i}"), meta(json!({})))
                .unwrap();
        }
        log.append(EventType::ModelDeployed, "shipped", meta(json!({})))
            .unwrap();

        let evals = log.list(Some(EventType::SafetyEvalRun), Some(2));
        assert_eq!(evals.len(), 2);
        assert_eq!(evals[0].description, "eval 2");
        assert_eq!(evals[1].description, "eval 1");
    }

    #[test]
    fn tamper_is_caught_at_the_tampered_id() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);

        for i in 0..3 {
            log.append(EventType::SafetyEvalRun, format!("eval {i}"), meta(json!({})))
                .unwrap();
        }

        log.tamper(1, "description", json!("ok")).unwrap();

        let report = log.verify_chain();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_id, Some(1));
    }

    #[test]
    fn tamper_with_metadata_is_caught() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);

        log.append(
            EventType::IncidentReported,
            "incident filed",
            meta(json!({"severity": "high"})),
        )
        .unwrap();

        log.tamper(0, "metadata", json!({"severity": "low"})).unwrap();

        let report = log.verify_chain();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_id, Some(0));
    }

    #[test]
    fn tamper_rejects_unknown_field() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        log.append(EventType::TrainingStarted, "run", meta(json!({})))
            .unwrap();

        let err = log.tamper(0, "hash", json!("ffff")).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn events_survive_reopen_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit_log.json");

        {
            let log = AuditLog::open(&path);
            log.append(EventType::TrainingStarted, "one", meta(json!({})))
                .unwrap();
            log.append(EventType::TrainingCompleted, "two", meta(json!({})))
                .unwrap();
        }

        let reopened = AuditLog::open(&path);
        assert_eq!(reopened.len(), 2);
        assert!(reopened.verify_chain().valid);
        assert_eq!(reopened.get(0).unwrap().description, "one");
        assert_eq!(reopened.get(1).unwrap().description, "two");
    }

    #[test]
    fn get_missing_event_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);

        let err = log.get(0).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[test]
    fn append_rolls_back_when_persistence_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the document path makes the rename fail.
        let path = dir.path().join("audit_log.json");
        std::fs::create_dir_all(&path).unwrap();

        let log = AuditLog::open(&path);
        let err = log
            .append(EventType::TrainingStarted, "doomed", meta(json!({})))
            .unwrap_err();

        assert!(matches!(err, LedgerError::Persistence(_)));
        assert!(log.is_empty());
    }

    #[test]
    fn empty_chain_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir);
        let report = log.verify_chain();
        assert!(report.valid);
        assert_eq!(report.checked_events, 0);
    }
}
