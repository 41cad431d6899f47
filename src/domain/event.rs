//! Audit-log event envelope and chain verification reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::crypto::chain_hash;

use super::time;

/// AI-governance events recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TrainingStarted,
    TrainingCompleted,
    SafetyEvalRun,
    SafetyEvalPassed,
    SafetyEvalFailed,
    ModelDeployed,
    IncidentReported,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventType::TrainingStarted => "training_started",
            EventType::TrainingCompleted => "training_completed",
            EventType::SafetyEvalRun => "safety_eval_run",
            EventType::SafetyEvalPassed => "safety_eval_passed",
            EventType::SafetyEvalFailed => "safety_eval_failed",
            EventType::ModelDeployed => "model_deployed",
            EventType::IncidentReported => "incident_reported",
        };
        write!(f, "{name}")
    }
}

/// One entry of the hash-chained audit log.
///
/// `hash` commits to every other field, including `previous_hash`, so a
/// modification anywhere in the prefix invalidates the suffix of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Position in the log, assigned monotonically from 0.
    pub id: u64,

    pub event_type: EventType,

    pub description: String,

    /// Free-form structured context supplied by the caller.
    pub metadata: serde_json::Map<String, serde_json::Value>,

    #[serde(with = "time::ts_seconds")]
    pub timestamp: DateTime<Utc>,

    /// Hash of the predecessor, or all zeros for the genesis event.
    pub previous_hash: String,

    /// `chain_hash` over the remaining fields and `previous_hash`.
    pub hash: String,
}

impl Event {
    /// The canonical record the chain hash commits to.
    pub fn chain_fields(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "event_type": self.event_type,
            "description": self.description,
            "metadata": self.metadata,
            "timestamp": time::format_ts(&self.timestamp),
            "previous_hash": self.previous_hash,
        })
    }

    /// Recompute the hash this event should carry.
    pub fn expected_hash(&self) -> String {
        chain_hash(&self.chain_fields(), &self.previous_hash)
    }
}

/// Outcome of a full chain verification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub checked_events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationReport {
    pub fn valid(checked_events: usize) -> Self {
        Self {
            valid: true,
            checked_events,
            first_invalid_id: None,
            reason: None,
        }
    }

    pub fn invalid(checked_events: usize, first_invalid_id: u64, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            checked_events,
            first_invalid_id: Some(first_invalid_id),
            reason: Some(reason.into()),
        }
    }
}

/// Summary returned by `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub event_count: usize,
    pub last_hash: Option<String>,
    pub merkle_root: Option<String>,
    pub chain_valid: bool,
}
