//! Error types for the ledger engines.
//!
//! Component operations return structured errors; the API layer maps them to
//! HTTP status codes. Integrity findings (a broken chain, a divergent
//! mirror) are NOT errors: they are data returned in verification reports.

use thiserror::Error;

/// Errors produced by the audit log, transparency store, ZK engine and
/// mirror simulator.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Client input malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Illegal state-machine transition.
    #[error("invalid state transition for {resource} {id}: {from} -> {to}")]
    InvalidTransition {
        resource: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// Operation precondition not met (e.g. committed count below the
    /// requested threshold).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Storage I/O failed; the in-memory mutation has been rolled back.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Stored or supplied JSON could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn invalid_transition(
        resource: &'static str,
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        LedgerError::InvalidTransition {
            resource,
            id: id.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
