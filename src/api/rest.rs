//! Route table for the REST surface.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::server::AppState;

use super::handlers::{auth, compliance, demo, events, health, mirror, proofs, transparency, zk};

/// Build the application router. Authentication middleware is layered on by
/// the server so tests can drive the same table.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        // Audit log
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/status", get(events::get_status))
        .route("/verify", get(events::verify_chain))
        // Merkle proofs
        .route("/proof/:id", get(proofs::get_proof))
        .route("/proof/verify", post(proofs::verify_inclusion))
        // Transparency
        .route(
            "/transparency/anonymous-id",
            post(transparency::derive_anonymous_id),
        )
        .route(
            "/transparency/concerns",
            post(transparency::raise_concern).get(transparency::list_concerns),
        )
        .route("/transparency/concerns/:id", get(transparency::get_concern))
        .route(
            "/transparency/concerns/:id/responses",
            get(transparency::list_responses),
        )
        .route(
            "/transparency/concerns/:id/dispute",
            post(transparency::dispute_concern),
        )
        .route("/transparency/responses", post(transparency::respond))
        .route("/transparency/resolutions", post(transparency::resolve))
        .route("/transparency/stats", get(transparency::stats))
        // Compliance
        .route(
            "/compliance/submissions",
            post(compliance::submit).get(compliance::list_submissions),
        )
        .route(
            "/compliance/submissions/:id",
            get(compliance::get_submission),
        )
        .route("/compliance/review", post(compliance::review))
        .route(
            "/compliance/status/:deployment_id",
            get(compliance::deployment_status),
        )
        .route("/compliance/templates", get(compliance::templates))
        // Threshold proofs
        .route("/zk/commitment", post(zk::create_commitment))
        .route("/zk/commitment/:id", get(zk::get_commitment))
        .route("/zk/prove", post(zk::prove))
        .route("/zk/verify", post(zk::verify))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/parties", get(auth::list_parties))
        .route("/auth/parties/:party_id", delete(auth::revoke_party))
        .route("/auth/me", get(auth::me))
        .route("/auth/rotate-key", post(auth::rotate_key))
        // Demo surface
        .route("/demo/reset", post(demo::reset_audit_log))
        .route("/demo/populate", post(demo::populate_events))
        .route("/demo/tamper", post(demo::tamper_event))
        .route("/demo/compliance-populate", post(demo::populate_compliance))
        .route("/demo/transparency-reset", post(demo::reset_transparency))
        .route("/demo/zk-reset", post(demo::reset_zk))
        .route("/demo/auth-reset", post(auth::reset_auth))
        .route("/demo/mirror/sync", post(mirror::sync))
        .route("/demo/mirror/status", get(mirror::status))
        .route("/demo/mirror/compare", get(mirror::compare))
        .route("/demo/mirror/tamper", post(mirror::tamper))
        .route("/demo/mirror/detect", get(mirror::detect))
        .route("/demo/mirror/reset", post(mirror::reset))
}
