//! API-key store.
//!
//! Keys are formatted `afr_<base64url(32 random bytes)>`. Only the SHA-256
//! of a key is stored; the raw key is returned exactly once, at registration
//! or rotation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use base64::Engine;
use rand::Rng;
use tracing::info;

use crate::crypto::sha256_hex;
use crate::domain::{time, Party, PartyRole};
use crate::infra::{load_document, save_document};

use super::AuthError;

/// API key prefix.
pub const API_KEY_PREFIX: &str = "afr_";

/// Registered parties keyed by `party_id`, persisted to `auth.json`.
pub struct AuthStore {
    path: PathBuf,
    parties: RwLock<BTreeMap<String, Party>>,
}

impl AuthStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let parties: BTreeMap<String, Party> = load_document(&path).unwrap_or_default();
        if !parties.is_empty() {
            info!(count = parties.len(), path = %path.display(), "restored auth store");
        }
        Self {
            path,
            parties: RwLock::new(parties),
        }
    }

    /// Generate a raw API key and its storage hash.
    pub fn generate_key() -> (String, String) {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        let raw = format!(
            "{API_KEY_PREFIX}{}",
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
        );
        let hash = Self::hash_key(&raw);
        (raw, hash)
    }

    /// Hash an API key for storage or lookup.
    pub fn hash_key(key: &str) -> String {
        sha256_hex(key.as_bytes())
    }

    /// Register a party and mint its key. The raw key in the return value is
    /// the only copy that will ever exist.
    pub fn register(&self, name: &str, role: PartyRole) -> Result<(Party, String), AuthError> {
        if name.trim().is_empty() {
            return Err(AuthError::Validation(
                "party name must not be empty".to_string(),
            ));
        }

        let mut rng = rand::thread_rng();
        let (raw_key, key_hash) = Self::generate_key();
        let party = Party {
            party_id: format!("party_{}", hex::encode(rng.gen::<[u8; 8]>())),
            name: name.trim().to_string(),
            role,
            key_hash,
            created_at: time::now(),
            revoked: false,
        };

        let mut parties = self.parties.write().unwrap();
        parties.insert(party.party_id.clone(), party.clone());
        if let Err(err) = save_document(&self.path, &*parties) {
            parties.remove(&party.party_id);
            return Err(AuthError::Ledger(err));
        }

        info!(party_id = %party.party_id, role = %party.role, "party registered");
        Ok((party, raw_key))
    }

    /// Resolve a raw key to its active party, if any.
    pub fn authenticate(&self, raw_key: &str) -> Option<Party> {
        let key_hash = Self::hash_key(raw_key);
        self.parties
            .read()
            .unwrap()
            .values()
            .find(|p| p.key_hash == key_hash && !p.revoked)
            .cloned()
    }

    /// Replace a party's key. The old key stops authenticating the moment
    /// the new hash is stored.
    pub fn rotate(&self, party_id: &str) -> Result<String, AuthError> {
        let mut parties = self.parties.write().unwrap();
        let party = parties
            .get_mut(party_id)
            .filter(|p| !p.revoked)
            .ok_or_else(|| AuthError::PartyNotFound(party_id.to_string()))?;

        let (raw_key, key_hash) = Self::generate_key();
        let old_hash = std::mem::replace(&mut party.key_hash, key_hash);

        if let Err(err) = save_document(&self.path, &*parties) {
            let party = parties.get_mut(party_id).expect("present above");
            party.key_hash = old_hash;
            return Err(AuthError::Ledger(err));
        }

        info!(party_id = %party_id, "API key rotated");
        Ok(raw_key)
    }

    /// Mark a party revoked; its key stops authenticating but the record
    /// stays for auditability.
    pub fn revoke(&self, party_id: &str) -> Result<Party, AuthError> {
        let mut parties = self.parties.write().unwrap();
        let party = parties
            .get_mut(party_id)
            .ok_or_else(|| AuthError::PartyNotFound(party_id.to_string()))?;

        let was_revoked = std::mem::replace(&mut party.revoked, true);
        let revoked = party.clone();

        if let Err(err) = save_document(&self.path, &*parties) {
            let party = parties.get_mut(party_id).expect("present above");
            party.revoked = was_revoked;
            return Err(AuthError::Ledger(err));
        }

        info!(party_id = %party_id, "party revoked");
        Ok(revoked)
    }

    pub fn get(&self, party_id: &str) -> Option<Party> {
        self.parties.read().unwrap().get(party_id).cloned()
    }

    /// All registered parties, active and revoked.
    pub fn list(&self) -> Vec<Party> {
        self.parties.read().unwrap().values().cloned().collect()
    }

    /// Demo only: drop all parties.
    pub fn reset(&self) -> Result<(), AuthError> {
        let mut parties = self.parties.write().unwrap();
        let before = std::mem::take(&mut *parties);
        if let Err(err) = save_document(&self.path, &*parties) {
            *parties = before;
            return Err(AuthError::Ledger(err));
        }
        Ok(())
    }
}
