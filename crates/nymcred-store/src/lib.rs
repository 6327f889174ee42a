//! Nymcred Store
//!
//! Keyed storage for serialized credentials. A credential set resolves
//! its master and children through this boundary when loading from an
//! index-mode serialization, and persists re-encrypted credentials back
//! through it.

mod fs;

use nymcred_core::{CredentialId, NymError, SerializedCredential};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

pub use fs::FsCredentialStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Credential has no ID")]
    MissingId,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for NymError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => NymError::CredentialNotFound(id),
            other => NymError::Storage(other.to_string()),
        }
    }
}

/// Trait for credential storage backends
pub trait CredentialStore: Send + Sync {
    /// Load a credential by ID
    fn load(&self, id: &CredentialId) -> Result<SerializedCredential, StoreError>;

    /// Save a credential under its own ID, replacing any previous copy
    fn save(&self, credential: &SerializedCredential) -> Result<(), StoreError>;

    /// Whether a credential with this ID is stored
    fn contains(&self, id: &CredentialId) -> bool {
        self.load(id).is_ok()
    }
}

/// In-memory credential store (for development/testing)
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<CredentialId, SerializedCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.credentials.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self, id: &CredentialId) -> Result<SerializedCredential, StoreError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        credentials
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))
    }

    fn save(&self, credential: &SerializedCredential) -> Result<(), StoreError> {
        let id = credential.id.ok_or(StoreError::MissingId)?;
        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        tracing::debug!("Storing credential {}", id);
        credentials.insert(id, credential.clone());
        Ok(())
    }

    fn contains(&self, id: &CredentialId) -> bool {
        self.credentials
            .read()
            .map(|c| c.contains_key(id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use nymcred_core::{CredentialId, CredentialRole, KeyMode, NymId, SerializedCredential};

    pub fn sample_credential(seed: &[u8]) -> SerializedCredential {
        SerializedCredential {
            version: SerializedCredential::VERSION,
            id: Some(CredentialId::digest(seed)),
            role: CredentialRole::Contact,
            mode: KeyMode::Public,
            nym_id: NymId::digest(b"nym"),
            master_id: Some(CredentialId::digest(b"master")),
            nonce: seed.to_vec(),
            keys: Vec::new(),
            source: None,
            contact_data: None,
            verification_set: None,
            signatures: Vec::new(),
        }
    }
}
