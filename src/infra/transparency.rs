//! Transparency store: concerns, responses, resolutions and compliance
//! submissions, plus the deployment gate over both.
//!
//! Every mutation also appends a matching audit event so the hash chain
//! covers the transparency layer. The two writes are not atomic; when the
//! audit append fails the primary mutation is rolled back and re-persisted,
//! and the operation fails with a persistence error.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::crypto::is_sha256_hex;
use crate::domain::{
    default_required_templates, time, ComplianceSubmission, Concern, ConcernResponse,
    ConcernStatus, DeploymentComplianceStatus, EventType, LedgerStats, MirrorRecord,
    MirrorRecordType, Resolution, ResolutionOutcome, ResponderRole, ReviewDecision,
    SubmissionStatus, TemplateRequirement, TemplateType,
};

use super::audit_log::AuditLog;
use super::error::{LedgerError, Result};
use super::store;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    concerns: BTreeMap<String, Concern>,
    responses: BTreeMap<String, ConcernResponse>,
    resolutions: BTreeMap<String, Resolution>,
    /// Kept in submission order; "latest" for the gate means last filed.
    submissions: Vec<ComplianceSubmission>,
}

/// The shared transparency ledger.
pub struct TransparencyLedger {
    path: PathBuf,
    audit: Arc<AuditLog>,
    state: RwLock<LedgerState>,
}

fn record_id() -> String {
    let mut rng = rand::thread_rng();
    hex::encode(rng.gen::<[u8; 8]>())
}

fn audit_meta(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

impl TransparencyLedger {
    pub fn open(path: impl Into<PathBuf>, audit: Arc<AuditLog>) -> Self {
        let path = path.into();
        let state: LedgerState = store::load_document(&path).unwrap_or_default();
        if !state.concerns.is_empty() || !state.submissions.is_empty() {
            info!(
                concerns = state.concerns.len(),
                submissions = state.submissions.len(),
                path = %path.display(),
                "restored transparency ledger"
            );
        }
        Self {
            path,
            audit,
            state: RwLock::new(state),
        }
    }

    /// Persist the mutated state, then append the paired audit event.
    ///
    /// Either failure restores `before` (re-persisting it after an audit
    /// failure) so the store and the chain never disagree about what
    /// happened.
    fn commit(
        &self,
        state: &mut LedgerState,
        before: LedgerState,
        event_type: EventType,
        description: String,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        if let Err(err) = store::save_document(&self.path, &*state) {
            *state = before;
            return Err(err);
        }

        if let Err(err) = self.audit.append(event_type, description, metadata) {
            *state = before;
            if let Err(persist_err) = store::save_document(&self.path, &*state) {
                warn!(
                    error = %persist_err,
                    "failed to persist rollback after audit append failure"
                );
            }
            return Err(err);
        }

        Ok(())
    }

    // === Concerns ===

    pub fn raise_concern(
        &self,
        anon_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Concern> {
        let (anon_id, title, description, target) =
            (anon_id.into(), title.into(), description.into(), target.into());
        if anon_id.is_empty() || title.is_empty() || description.is_empty() {
            return Err(LedgerError::Validation(
                "anon_id, title and description must not be empty".to_string(),
            ));
        }

        let concern = Concern {
            id: record_id(),
            anon_id,
            title,
            description,
            target,
            status: ConcernStatus::Open,
            created_at: time::now(),
            resolution: None,
        };

        let mut state = self.state.write().unwrap();
        let before = state.clone();
        state.concerns.insert(concern.id.clone(), concern.clone());
        self.commit(
            &mut state,
            before,
            EventType::IncidentReported,
            format!("Concern raised: {}", concern.title),
            audit_meta(json!({
                "action": "concern_raised",
                "concern_id": concern.id,
                "target": concern.target,
            })),
        )?;

        Ok(concern)
    }

    pub fn get_concern(&self, id: &str) -> Result<Concern> {
        self.state
            .read()
            .unwrap()
            .concerns
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("concern", id))
    }

    /// List concerns, newest first, with optional filters.
    pub fn list_concerns(
        &self,
        status: Option<ConcernStatus>,
        target: Option<&str>,
    ) -> Vec<Concern> {
        let state = self.state.read().unwrap();
        let mut out: Vec<Concern> = state
            .concerns
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .filter(|c| target.map_or(true, |t| c.target == t))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        out
    }

    /// Record a response. A first response moves an open concern to
    /// `responded`; a disputed concern keeps its status; a resolved concern
    /// rejects further responses.
    pub fn respond(
        &self,
        concern_id: &str,
        responder_role: ResponderRole,
        content: impl Into<String>,
    ) -> Result<ConcernResponse> {
        let content = content.into();
        if content.is_empty() {
            return Err(LedgerError::Validation(
                "response content must not be empty".to_string(),
            ));
        }

        let mut state = self.state.write().unwrap();
        let concern = state
            .concerns
            .get(concern_id)
            .ok_or_else(|| LedgerError::not_found("concern", concern_id))?;
        if concern.status == ConcernStatus::Resolved {
            return Err(LedgerError::invalid_transition(
                "concern",
                concern_id,
                "resolved",
                "responded",
            ));
        }

        let response = ConcernResponse {
            id: record_id(),
            concern_id: concern_id.to_string(),
            responder_role,
            content,
            created_at: time::now(),
        };

        let before = state.clone();
        state
            .responses
            .insert(response.id.clone(), response.clone());
        let concern = state.concerns.get_mut(concern_id).expect("checked above");
        if concern.status == ConcernStatus::Open {
            concern.status = ConcernStatus::Responded;
        }

        self.commit(
            &mut state,
            before,
            EventType::IncidentReported,
            format!("Concern response recorded for {concern_id}"),
            audit_meta(json!({
                "action": "concern_responded",
                "concern_id": concern_id,
                "response_id": response.id,
            })),
        )?;

        Ok(response)
    }

    /// Responses to one concern, oldest first.
    pub fn responses_for(&self, concern_id: &str) -> Result<Vec<ConcernResponse>> {
        let state = self.state.read().unwrap();
        if !state.concerns.contains_key(concern_id) {
            return Err(LedgerError::not_found("concern", concern_id));
        }
        let mut out: Vec<ConcernResponse> = state
            .responses
            .values()
            .filter(|r| r.concern_id == concern_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Escalate a concern to `disputed`. Legal from `open` and `responded`.
    pub fn dispute(&self, concern_id: &str) -> Result<Concern> {
        let mut state = self.state.write().unwrap();
        let concern = state
            .concerns
            .get(concern_id)
            .ok_or_else(|| LedgerError::not_found("concern", concern_id))?;
        match concern.status {
            ConcernStatus::Open | ConcernStatus::Responded => {}
            other => {
                return Err(LedgerError::invalid_transition(
                    "concern",
                    concern_id,
                    other.to_string(),
                    "disputed",
                ));
            }
        }

        let before = state.clone();
        let concern = state.concerns.get_mut(concern_id).expect("checked above");
        concern.status = ConcernStatus::Disputed;
        let disputed = concern.clone();

        self.commit(
            &mut state,
            before,
            EventType::IncidentReported,
            format!("Concern disputed: {concern_id}"),
            audit_meta(json!({
                "action": "concern_disputed",
                "concern_id": concern_id,
            })),
        )?;

        Ok(disputed)
    }

    /// Close out a concern. Terminal; only auditors reach this through the
    /// API layer.
    pub fn resolve(
        &self,
        concern_id: &str,
        auditor_id: impl Into<String>,
        outcome: ResolutionOutcome,
        notes: impl Into<String>,
    ) -> Result<Resolution> {
        let mut state = self.state.write().unwrap();
        let concern = state
            .concerns
            .get(concern_id)
            .ok_or_else(|| LedgerError::not_found("concern", concern_id))?;
        if concern.status == ConcernStatus::Resolved {
            return Err(LedgerError::invalid_transition(
                "concern",
                concern_id,
                "resolved",
                "resolved",
            ));
        }

        let resolution = Resolution {
            id: record_id(),
            concern_id: concern_id.to_string(),
            auditor_id: auditor_id.into(),
            outcome,
            notes: notes.into(),
            created_at: time::now(),
        };

        let before = state.clone();
        state
            .resolutions
            .insert(resolution.id.clone(), resolution.clone());
        let concern = state.concerns.get_mut(concern_id).expect("checked above");
        concern.status = ConcernStatus::Resolved;
        concern.resolution = Some(resolution.clone());

        self.commit(
            &mut state,
            before,
            EventType::IncidentReported,
            format!("Concern resolved: {concern_id}"),
            audit_meta(json!({
                "action": "concern_resolved",
                "concern_id": concern_id,
                "resolution_id": resolution.id,
                "outcome": resolution.outcome,
            })),
        )?;

        Ok(resolution)
    }

    // === Compliance submissions ===

    pub fn submit_compliance(
        &self,
        lab_id: impl Into<String>,
        deployment_id: impl Into<String>,
        model_id: impl Into<String>,
        template_type: TemplateType,
        title: impl Into<String>,
        evidence_hash: impl Into<String>,
    ) -> Result<ComplianceSubmission> {
        let (lab_id, deployment_id, model_id, title, evidence_hash) = (
            lab_id.into(),
            deployment_id.into(),
            model_id.into(),
            title.into(),
            evidence_hash.into(),
        );
        if deployment_id.is_empty() || model_id.is_empty() || title.is_empty() {
            return Err(LedgerError::Validation(
                "deployment_id, model_id and title must not be empty".to_string(),
            ));
        }
        if !is_sha256_hex(&evidence_hash) {
            return Err(LedgerError::Validation(
                "evidence_hash must be a 64-char lowercase hex SHA-256 digest".to_string(),
            ));
        }

        let submission = ComplianceSubmission {
            id: record_id(),
            lab_id,
            deployment_id,
            model_id,
            template_type,
            title,
            evidence_hash,
            status: SubmissionStatus::Submitted,
            submitted_at: time::now(),
            reviewed_at: None,
            reviewer_notes: None,
        };

        let mut state = self.state.write().unwrap();
        let before = state.clone();
        state.submissions.push(submission.clone());

        self.commit(
            &mut state,
            before,
            EventType::SafetyEvalRun,
            format!(
                "Compliance submission filed: {} for {}",
                submission.template_type, submission.deployment_id
            ),
            audit_meta(json!({
                "action": "compliance_submitted",
                "submission_id": submission.id,
                "deployment_id": submission.deployment_id,
                "template_type": submission.template_type,
            })),
        )?;

        Ok(submission)
    }

    pub fn get_submission(&self, id: &str) -> Result<ComplianceSubmission> {
        self.state
            .read()
            .unwrap()
            .submissions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("submission", id))
    }

    /// List submissions, newest first, with optional filters.
    pub fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        template_type: Option<TemplateType>,
        deployment_id: Option<&str>,
    ) -> Vec<ComplianceSubmission> {
        let state = self.state.read().unwrap();
        state
            .submissions
            .iter()
            .rev()
            .filter(|s| status.map_or(true, |v| s.status == v))
            .filter(|s| template_type.map_or(true, |v| s.template_type == v))
            .filter(|s| deployment_id.map_or(true, |v| s.deployment_id == v))
            .cloned()
            .collect()
    }

    /// Apply an auditor decision. Terminal submissions reject re-review; a
    /// rejected template is superseded only by filing a new submission.
    pub fn review(
        &self,
        submission_id: &str,
        decision: ReviewDecision,
        notes: impl Into<String>,
    ) -> Result<ComplianceSubmission> {
        let mut state = self.state.write().unwrap();
        let index = state
            .submissions
            .iter()
            .position(|s| s.id == submission_id)
            .ok_or_else(|| LedgerError::not_found("submission", submission_id))?;

        let current = state.submissions[index].status;
        if current.is_terminal() {
            return Err(LedgerError::invalid_transition(
                "submission",
                submission_id,
                current.to_string(),
                match decision {
                    ReviewDecision::Verify => "verified",
                    ReviewDecision::Reject => "rejected",
                },
            ));
        }

        let before = state.clone();
        let submission = &mut state.submissions[index];
        submission.status = match decision {
            ReviewDecision::Verify => SubmissionStatus::Verified,
            ReviewDecision::Reject => SubmissionStatus::Rejected,
        };
        submission.reviewed_at = Some(time::now());
        submission.reviewer_notes = Some(notes.into());
        let reviewed = submission.clone();

        let (event_type, verb) = match decision {
            ReviewDecision::Verify => (EventType::SafetyEvalPassed, "verified"),
            ReviewDecision::Reject => (EventType::SafetyEvalFailed, "rejected"),
        };
        self.commit(
            &mut state,
            before,
            event_type,
            format!(
                "Compliance submission {verb}: {} for {}",
                reviewed.template_type, reviewed.deployment_id
            ),
            audit_meta(json!({
                "action": "compliance_reviewed",
                "submission_id": reviewed.id,
                "deployment_id": reviewed.deployment_id,
                "decision": reviewed.status,
            })),
        )?;

        Ok(reviewed)
    }

    // === Deployment gate ===

    /// Evaluate the deployment gate for `(deployment_id, model_id)`.
    ///
    /// Per required template the latest non-rejected submission decides
    /// satisfaction; rejected submissions stay in the record but never
    /// satisfy. Any non-resolved concern whose target references the
    /// deployment or one of its submissions blocks clearance.
    pub fn deployment_status(
        &self,
        deployment_id: &str,
        model_id: &str,
        required_templates: Option<Vec<TemplateType>>,
    ) -> DeploymentComplianceStatus {
        let required = required_templates.unwrap_or_else(default_required_templates);
        let state = self.state.read().unwrap();

        let mut templates = Vec::with_capacity(required.len());
        let mut blocking = Vec::new();

        for template in &required {
            // Last filed non-rejected submission for this template.
            let latest = state
                .submissions
                .iter()
                .filter(|s| {
                    s.deployment_id == deployment_id
                        && s.model_id == model_id
                        && s.template_type == *template
                        && s.status != SubmissionStatus::Rejected
                })
                .last();

            let satisfied = matches!(latest, Some(s) if s.status == SubmissionStatus::Verified);
            match latest {
                None => blocking.push(format!("missing template: {template}")),
                Some(_) if !satisfied => {
                    blocking.push(format!("template {template} not verified"));
                }
                Some(_) => {}
            }

            templates.push(TemplateRequirement {
                template_type: *template,
                satisfied,
                submission_id: latest.map(|s| s.id.clone()),
                submission_status: latest.map(|s| s.status),
            });
        }

        // Concerns referencing the deployment or any of its submissions.
        let submission_ids: BTreeSet<&str> = state
            .submissions
            .iter()
            .filter(|s| s.deployment_id == deployment_id)
            .map(|s| s.id.as_str())
            .collect();
        let unresolved_concerns: Vec<String> = state
            .concerns
            .values()
            .filter(|c| c.status.is_unresolved())
            .filter(|c| c.target == deployment_id || submission_ids.contains(c.target.as_str()))
            .map(|c| c.id.clone())
            .collect();

        if !unresolved_concerns.is_empty() {
            let n = unresolved_concerns.len();
            blocking.push(format!(
                "{n} unresolved concern{}",
                if n == 1 { "" } else { "s" }
            ));
        }

        let cleared = blocking.is_empty();
        DeploymentComplianceStatus {
            deployment_id: deployment_id.to_string(),
            model_id: model_id.to_string(),
            required_templates: required,
            templates,
            unresolved_concerns,
            cleared,
            blocking,
        }
    }

    // === Aggregates and snapshots ===

    pub fn stats(&self) -> LedgerStats {
        let state = self.state.read().unwrap();

        let mut concerns_by_status = BTreeMap::new();
        for status in [
            ConcernStatus::Open,
            ConcernStatus::Responded,
            ConcernStatus::Disputed,
            ConcernStatus::Resolved,
        ] {
            let count = state.concerns.values().filter(|c| c.status == status).count();
            concerns_by_status.insert(status.to_string(), count);
        }

        let mut submissions_by_status = BTreeMap::new();
        for status in [
            SubmissionStatus::Submitted,
            SubmissionStatus::UnderReview,
            SubmissionStatus::Verified,
            SubmissionStatus::Rejected,
        ] {
            let count = state.submissions.iter().filter(|s| s.status == status).count();
            submissions_by_status.insert(status.to_string(), count);
        }

        let mut submissions_by_template = BTreeMap::new();
        for template in TemplateType::all() {
            let count = state
                .submissions
                .iter()
                .filter(|s| s.template_type == template)
                .count();
            submissions_by_template.insert(template.to_string(), count);
        }

        LedgerStats {
            total_concerns: state.concerns.len(),
            concerns_by_status,
            total_responses: state.responses.len(),
            total_resolutions: state.resolutions.len(),
            total_submissions: state.submissions.len(),
            submissions_by_status,
            submissions_by_template,
        }
    }

    /// Canonical record set the mirrors replicate: submissions and concerns,
    /// sorted by id.
    pub fn mirror_records(&self) -> Vec<MirrorRecord> {
        let state = self.state.read().unwrap();
        let mut records: Vec<MirrorRecord> = state
            .submissions
            .iter()
            .map(|s| MirrorRecord {
                record_type: MirrorRecordType::Submission,
                id: s.id.clone(),
                data: serde_json::to_value(s).unwrap_or(serde_json::Value::Null),
            })
            .chain(state.concerns.values().map(|c| MirrorRecord {
                record_type: MirrorRecordType::Concern,
                id: c.id.clone(),
                data: serde_json::to_value(c).unwrap_or(serde_json::Value::Null),
            }))
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Demo only: drop all records.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let before = state.clone();
        *state = LedgerState::default();
        if let Err(err) = store::save_document(&self.path, &*state) {
            *state = before;
            return Err(err);
        }
        info!("transparency ledger reset");
        Ok(())
    }
}
