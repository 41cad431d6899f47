//! Transparency Ledger Library
//!
//! Tamper-evident transparency service coordinating labs, auditors and
//! government around AI-deployment compliance.
//!
//! ## Modules
//!
//! - [`crypto`] - Canonical hashing, chain hashing, anonymous IDs
//! - [`domain`] - Core record types (events, concerns, submissions, parties)
//! - [`infra`] - Engines: audit log, Merkle service, transparency store,
//!   ZK threshold engine, mirror simulator
//! - [`auth`] - API-key authentication and registration rate limiting
//! - [`api`] - REST routes and structured error mapping
//! - [`server`] - Configuration and HTTP bootstrap

pub mod api;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod server;

// Re-export commonly used types
pub use domain::{
    ComplianceSubmission, Concern, DeploymentComplianceStatus, Event, EventType, Party,
    PartyRole, VerificationReport,
};

pub use infra::{
    AuditLog, LedgerError, MerkleTree, MirrorSimulator, Result, TransparencyLedger, ZkEngine,
};
