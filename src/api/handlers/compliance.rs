//! Compliance submission and deployment-gate endpoints.

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::auth::CallerIdentity;
use crate::domain::{
    ComplianceSubmission, DeploymentComplianceStatus, PartyRole, ReviewDecision,
    SubmissionStatus, TemplateType,
};
use crate::server::AppState;

use super::require_role;

#[derive(Debug, Deserialize)]
pub struct SubmitComplianceRequest {
    pub deployment_id: String,
    pub model_id: String,
    pub template_type: TemplateType,
    pub title: String,
    pub evidence_hash: String,
}

/// POST /compliance/submissions - lab only; `lab_id` is the caller.
pub async fn submit(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(request): Json<SubmitComplianceRequest>,
) -> ApiResult<Json<ComplianceSubmission>> {
    let lab = require_role(&caller, PartyRole::Lab)?;
    let submission = state.transparency.submit_compliance(
        lab.party_id,
        request.deployment_id,
        request.model_id,
        request.template_type,
        request.title,
        request.evidence_hash,
    )?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionsQuery {
    pub status: Option<SubmissionStatus>,
    pub template_type: Option<TemplateType>,
    pub deployment_id: Option<String>,
}

/// GET /compliance/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionsQuery>,
) -> Json<Vec<ComplianceSubmission>> {
    Json(state.transparency.list_submissions(
        query.status,
        query.template_type,
        query.deployment_id.as_deref(),
    ))
}

/// GET /compliance/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ComplianceSubmission>> {
    Ok(Json(state.transparency.get_submission(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub submission_id: String,
    pub decision: ReviewDecision,
    pub notes: String,
}

/// POST /compliance/review - auditor only.
pub async fn review(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<Json<ComplianceSubmission>> {
    require_role(&caller, PartyRole::Auditor)?;
    let submission =
        state
            .transparency
            .review(&request.submission_id, request.decision, request.notes)?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
pub struct DeploymentStatusQuery {
    pub model_id: String,
}

/// GET /compliance/status/:deployment_id?model_id= - the deployment gate.
pub async fn deployment_status(
    State(state): State<AppState>,
    Path(deployment_id): Path<String>,
    Query(query): Query<DeploymentStatusQuery>,
) -> Json<DeploymentComplianceStatus> {
    Json(
        state
            .transparency
            .deployment_status(&deployment_id, &query.model_id, None),
    )
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub template_type: TemplateType,
    pub description: &'static str,
}

/// GET /compliance/templates - the known template catalog.
pub async fn templates() -> Json<Vec<TemplateInfo>> {
    let catalog = TemplateType::all().map(|template_type| TemplateInfo {
        template_type,
        description: match template_type {
            TemplateType::SafetyEvaluation => "Pre-deployment safety evaluation results",
            TemplateType::TrainingData => "Training data provenance documentation",
            TemplateType::CapabilityAssessment => "Dangerous capability assessment",
            TemplateType::RedTeamReport => "Red team testing results",
            TemplateType::HumanOversight => "Human oversight attestation",
            TemplateType::IncidentReport => "Post-deployment incident report",
        },
    });
    Json(catalog.into_iter().collect())
}
