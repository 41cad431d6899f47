//! REST handlers, grouped by surface area.

pub mod auth;
pub mod compliance;
pub mod demo;
pub mod events;
pub mod health;
pub mod mirror;
pub mod proofs;
pub mod transparency;
pub mod zk;

use crate::api::error::ApiResult;
use crate::auth::{AuthError, CallerIdentity};
use crate::domain::{Party, PartyRole};

/// Require an authenticated caller, whatever their role.
pub(crate) fn require_party(caller: &CallerIdentity) -> ApiResult<Party> {
    caller.0.clone().ok_or_else(|| AuthError::MissingKey.into())
}

/// Require an authenticated caller with a specific role: 401 without a key,
/// 403 with the wrong one.
pub(crate) fn require_role(caller: &CallerIdentity, required: PartyRole) -> ApiResult<Party> {
    match &caller.0 {
        None => Err(AuthError::MissingKey.into()),
        Some(party) if party.role != required => {
            Err(AuthError::RoleMismatch { required }.into())
        }
        Some(party) => Ok(party.clone()),
    }
}
