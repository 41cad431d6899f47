//! Authentication: API-key store, registration rate limiting, and the
//! request middleware.

mod api_key;
mod middleware;
mod rate_limit;

pub use api_key::{AuthStore, API_KEY_PREFIX};
pub use middleware::{auth_middleware, AuthState, CallerIdentity, API_KEY_HEADER};
pub use rate_limit::{RegistrationGate, SlidingWindowLimiter};

use thiserror::Error;

use crate::infra::LedgerError;

/// Errors raised by the auth store and middleware.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("API key required: provide the X-API-Key header")]
    MissingKey,

    #[error("invalid or revoked API key")]
    InvalidKey,

    #[error("this endpoint requires the {required} role")]
    RoleMismatch { required: crate::domain::PartyRole },

    #[error("rate limit exceeded: at most 5 registrations per minute")]
    RateLimited,

    #[error("party not found: {0}")]
    PartyNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
