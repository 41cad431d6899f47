//! Demo endpoints: seed data, reset, and deliberate tampering.
//!
//! These exist to demonstrate tamper-evidence end to end; none of them
//! belongs on a production surface.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiResult;
use crate::crypto::sha256_hex;
use crate::domain::{Event, EventType, ResolutionOutcome, ReviewDecision, TemplateType};
use crate::server::AppState;

/// POST /demo/reset - empty the audit log.
pub async fn reset_audit_log(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.audit_log.reset()?;
    Ok(Json(json!({ "message": "audit log reset" })))
}

fn meta(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// POST /demo/populate - seed eight representative lifecycle events.
pub async fn populate_events(State(state): State<AppState>) -> ApiResult<Json<Vec<Event>>> {
    let seed: [(EventType, &str, serde_json::Value); 8] = [
        (
            EventType::TrainingStarted,
            "Training run started for gpt-safe-v2.1",
            json!({"model_id": "gpt-safe-v2.1", "training_flops": 1.2e24}),
        ),
        (
            EventType::TrainingCompleted,
            "Training run completed",
            json!({"model_id": "gpt-safe-v2.1", "final_loss": 1.87}),
        ),
        (
            EventType::SafetyEvalRun,
            "Autonomy evaluation suite executed",
            json!({"model_id": "gpt-safe-v2.1", "suite": "autonomy-v4"}),
        ),
        (
            EventType::SafetyEvalPassed,
            "Autonomy evaluation passed",
            json!({"model_id": "gpt-safe-v2.1", "suite": "autonomy-v4"}),
        ),
        (
            EventType::SafetyEvalRun,
            "Bio misuse evaluation suite executed",
            json!({"model_id": "gpt-safe-v2.1", "suite": "bio-v2"}),
        ),
        (
            EventType::SafetyEvalFailed,
            "Bio misuse evaluation failed on first pass",
            json!({"model_id": "gpt-safe-v2.1", "suite": "bio-v2", "failing_cases": 3}),
        ),
        (
            EventType::SafetyEvalPassed,
            "Bio misuse evaluation passed after mitigations",
            json!({"model_id": "gpt-safe-v2.1", "suite": "bio-v2"}),
        ),
        (
            EventType::ModelDeployed,
            "Model deployed to production",
            json!({"model_id": "gpt-safe-v2.1", "deployment_id": "gpt-safe-v2.1-prod"}),
        ),
    ];

    let mut events = Vec::with_capacity(seed.len());
    for (event_type, description, metadata) in seed {
        events.push(state.audit_log.append(event_type, description, meta(metadata))?);
    }
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct TamperRequest {
    pub event_id: u64,
    pub field: String,
    pub new_value: serde_json::Value,
}

/// POST /demo/tamper - mutate a stored event without rehashing, so
/// `GET /verify` has something to catch.
pub async fn tamper_event(
    State(state): State<AppState>,
    Json(request): Json<TamperRequest>,
) -> ApiResult<Json<Event>> {
    let event = state
        .audit_log
        .tamper(request.event_id, &request.field, request.new_value)?;
    Ok(Json(event))
}

/// POST /demo/compliance-populate - a deployment mid-review: two templates
/// verified, one pending, one concern resolved and one open.
pub async fn populate_compliance(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let deployment_id = "gpt-safe-v2.1-prod";
    let model_id = "gpt-safe-v2.1";
    let lab_id = "demo_lab";

    let safety = state.transparency.submit_compliance(
        lab_id,
        deployment_id,
        model_id,
        TemplateType::SafetyEvaluation,
        "Safety evaluation results for gpt-safe-v2.1",
        sha256_hex(b"safety evaluation evidence bundle"),
    )?;
    state
        .transparency
        .review(&safety.id, ReviewDecision::Verify, "Evidence digest matches the transcript bundle")?;

    let capability = state.transparency.submit_compliance(
        lab_id,
        deployment_id,
        model_id,
        TemplateType::CapabilityAssessment,
        "Dangerous capability assessment",
        sha256_hex(b"capability assessment evidence bundle"),
    )?;
    state
        .transparency
        .review(&capability.id, ReviewDecision::Verify, "Assessment methodology verified")?;

    let red_team = state.transparency.submit_compliance(
        lab_id,
        deployment_id,
        model_id,
        TemplateType::RedTeamReport,
        "External red team findings",
        sha256_hex(b"red team report evidence bundle"),
    )?;

    let resolved = state.transparency.raise_concern(
        "anon_3f9a1c2b8d4e",
        "Eval transcripts incomplete",
        "The published safety evaluation omits two failing transcripts.",
        deployment_id,
    )?;
    state
        .transparency
        .resolve(&resolved.id, "demo_auditor", ResolutionOutcome::Accepted, "Missing transcripts were published")?;

    let open = state.transparency.raise_concern(
        "anon_7c5e2d914b0a",
        "Red team scope too narrow",
        "The red team engagement excluded fine-tuning attacks.",
        deployment_id,
    )?;

    Ok(Json(json!({
        "deployment_id": deployment_id,
        "model_id": model_id,
        "submissions": [safety.id, capability.id, red_team.id],
        "resolved_concern": resolved.id,
        "open_concern": open.id,
    })))
}

/// POST /demo/transparency-reset - drop all concerns and submissions.
pub async fn reset_transparency(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    state.transparency.reset()?;
    Ok(Json(json!({ "message": "transparency ledger reset" })))
}

/// POST /demo/zk-reset - drop all commitments.
pub async fn reset_zk(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.zk.reset()?;
    Ok(Json(json!({ "message": "ZK commitment store reset" })))
}
