//! Engine implementations backing the REST surface.
//!
//! Each engine owns its state behind a component-local `RwLock` and persists
//! it as one canonical JSON document with atomic rewrites. Integrity checks
//! return reports, not errors.

mod audit_log;
mod error;
mod merkle;
mod mirror;
mod store;
mod transparency;
mod zk;

pub use audit_log::AuditLog;
pub use error::{LedgerError, Result};
pub use merkle::{verify_proof, MerkleTree, Position, ProofStep};
pub use mirror::MirrorSimulator;
pub use store::{load_document, save_document};
pub use transparency::TransparencyLedger;
pub use zk::ZkEngine;
