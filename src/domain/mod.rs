//! Core domain types for the transparency ledger.
//!
//! - [`event`] - audit-log events and chain verification reports
//! - [`transparency`] - concerns, responses, resolutions, compliance submissions
//! - [`party`] - authorized parties and roles
//! - [`zk`] - threshold commitments and proofs
//! - [`mirror`] - per-party ledger snapshots
//! - [`time`] - second-precision ISO-8601 timestamp handling

mod event;
mod mirror;
mod party;
pub mod time;
mod transparency;
mod zk;

pub use event::{Event, EventType, LedgerStatus, VerificationReport};
pub use mirror::{
    MirrorComparison, MirrorDetection, MirrorRecord, MirrorRecordType, MirrorSnapshot,
    MirrorStatus, MirrorSyncReport, MirrorTamperReport,
};
pub use party::{Party, PartyInfo, PartyRole};
pub use transparency::{
    default_required_templates, ComplianceSubmission, Concern, ConcernResponse, ConcernStatus,
    DeploymentComplianceStatus, LedgerStats, Resolution, ResolutionOutcome, ResponderRole,
    ReviewDecision, SubmissionStatus, TemplateRequirement, TemplateType,
};
pub use zk::{ZkCommitment, ZkCommitmentRecord, ZkProof, ZkVerification};
