//! Concerns, responses, resolutions and compliance submissions.
//!
//! Two small state machines drive the deployment gate:
//!
//! ```text
//! Concern:    open -[response]-> responded -[dispute]-> disputed
//!             {open|responded|disputed} -[resolution]-> resolved   (terminal)
//!
//! Submission: submitted -[begin_review]-> under_review
//!             {submitted|under_review} -[verify|reject]-> verified|rejected  (terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::time;

/// Compliance templates labs file against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    SafetyEvaluation,
    TrainingData,
    CapabilityAssessment,
    RedTeamReport,
    HumanOversight,
    IncidentReport,
}

impl TemplateType {
    pub fn all() -> [TemplateType; 6] {
        [
            TemplateType::SafetyEvaluation,
            TemplateType::TrainingData,
            TemplateType::CapabilityAssessment,
            TemplateType::RedTeamReport,
            TemplateType::HumanOversight,
            TemplateType::IncidentReport,
        ]
    }
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateType::SafetyEvaluation => "safety_evaluation",
            TemplateType::TrainingData => "training_data",
            TemplateType::CapabilityAssessment => "capability_assessment",
            TemplateType::RedTeamReport => "red_team_report",
            TemplateType::HumanOversight => "human_oversight",
            TemplateType::IncidentReport => "incident_report",
        };
        write!(f, "{name}")
    }
}

/// Templates a deployment must have verified before it clears the gate.
pub fn default_required_templates() -> Vec<TemplateType> {
    vec![
        TemplateType::SafetyEvaluation,
        TemplateType::CapabilityAssessment,
        TemplateType::RedTeamReport,
    ]
}

/// Review lifecycle of a compliance submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    UnderReview,
    Verified,
    Rejected,
}

impl SubmissionStatus {
    /// Terminal statuses admit no further review.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Verified | SubmissionStatus::Rejected)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::Verified => "verified",
            SubmissionStatus::Rejected => "rejected",
        };
        write!(f, "{name}")
    }
}

/// Auditor decision on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Verify,
    Reject,
}

/// Resolution workflow of a concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernStatus {
    Open,
    Responded,
    Disputed,
    Resolved,
}

impl ConcernStatus {
    /// Any status other than `resolved` blocks the deployment gate.
    pub fn is_unresolved(&self) -> bool {
        !matches!(self, ConcernStatus::Resolved)
    }
}

impl std::fmt::Display for ConcernStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConcernStatus::Open => "open",
            ConcernStatus::Responded => "responded",
            ConcernStatus::Disputed => "disputed",
            ConcernStatus::Resolved => "resolved",
        };
        write!(f, "{name}")
    }
}

/// Who answered a concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderRole {
    Lab,
    Auditor,
}

/// Auditor verdict on a concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Accepted,
    Rejected,
    NeedsMoreInfo,
}

/// A concern raised against a deployment or submission, attributed only to
/// an anonymous pseudonym.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concern {
    pub id: String,
    /// Anonymous submitter pseudonym (`anon_<12-hex>`), derived client-side.
    pub anon_id: String,
    pub title: String,
    pub description: String,
    /// Free text naming what the concern is about, typically a deployment id
    /// or a submission id.
    pub target: String,
    pub status: ConcernStatus,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolution: Option<Resolution>,
}

/// A lab or auditor answer to a concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcernResponse {
    pub id: String,
    pub concern_id: String,
    pub responder_role: ResponderRole,
    pub content: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// Final auditor disposition of a concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub id: String,
    pub concern_id: String,
    pub auditor_id: String,
    pub outcome: ResolutionOutcome,
    pub notes: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// A compliance document filed by a lab against a required template.
///
/// Only the evidence digest enters the ledger; the evidence itself stays with
/// the lab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSubmission {
    pub id: String,
    pub lab_id: String,
    pub deployment_id: String,
    pub model_id: String,
    pub template_type: TemplateType,
    pub title: String,
    /// Client-asserted SHA-256 digest of the supporting evidence (64 hex).
    pub evidence_hash: String,
    pub status: SubmissionStatus,
    #[serde(with = "time::ts_seconds")]
    pub submitted_at: DateTime<Utc>,
    #[serde(
        with = "time::ts_seconds_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reviewer_notes: Option<String>,
}

/// Gate verdict for one required template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRequirement {
    pub template_type: TemplateType,
    /// True when the latest non-rejected submission for this template is
    /// verified.
    pub satisfied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_status: Option<SubmissionStatus>,
}

/// The deployment gate: clears a release only when every required template is
/// verified and every concern touching the deployment is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentComplianceStatus {
    pub deployment_id: String,
    pub model_id: String,
    pub required_templates: Vec<TemplateType>,
    pub templates: Vec<TemplateRequirement>,
    /// Ids of concerns in `open`, `responded` or `disputed` whose target
    /// references the deployment or one of its submissions.
    pub unresolved_concerns: Vec<String>,
    pub cleared: bool,
    /// Human-readable reasons when `cleared` is false.
    pub blocking: Vec<String>,
}

/// Aggregate counters for `GET /transparency/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_concerns: usize,
    pub concerns_by_status: BTreeMap<String, usize>,
    pub total_responses: usize,
    pub total_resolutions: usize,
    pub total_submissions: usize,
    pub submissions_by_status: BTreeMap<String, usize>,
    pub submissions_by_template: BTreeMap<String, usize>,
}
