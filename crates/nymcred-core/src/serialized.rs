//! Serialized forms exchanged with the credential store
//!
//! These structures are the wire/storage representation of credentials,
//! identity sources and whole credential sets. They carry no behavior
//! beyond encoding; the key crate and the credential set give them
//! meaning.

use serde::{Deserialize, Serialize};

use crate::contact::ContactData;
use crate::error::NymError;
use crate::id::{CredentialId, NymId};
use crate::role::{CredentialRole, KeyAlgorithm, KeyRole, SourceType};
use crate::signature::Signature;
use crate::verification::VerificationSet;

/// Whether a serialized credential includes its wrapped private halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Public,
    Private,
}

/// Serialization mode of a whole credential set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSetMode {
    /// Only IDs; content is resolved through the credential store
    Index,
    /// Every credential inlined in its public form
    Full,
}

/// One key slot of a key credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedKey {
    pub role: KeyRole,

    pub algorithm: KeyAlgorithm,

    #[serde(with = "crate::hex_serde::bytes")]
    pub public: Vec<u8>,

    /// Private half, wrapped under a passphrase. Present only in
    /// private-mode serializations.
    #[serde(
        default,
        with = "crate::hex_serde::opt_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub private: Option<Vec<u8>>,
}

/// Public form of a Nym identity source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNymIdSource {
    pub version: u32,

    pub source_type: SourceType,

    pub algorithm: KeyAlgorithm,

    #[serde(with = "crate::hex_serde::bytes")]
    pub public_key: Vec<u8>,
}

impl SerializedNymIdSource {
    pub const VERSION: u32 = 1;

    /// The Nym ID committed to by this source
    pub fn nym_id(&self) -> Result<NymId, NymError> {
        Ok(NymId::digest(&serde_json::to_vec(self)?))
    }
}

/// A single credential in public or private form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedCredential {
    pub version: u32,

    /// Content-derived ID. Absent only in the form that is hashed to
    /// produce it.
    pub id: Option<CredentialId>,

    pub role: CredentialRole,

    pub mode: KeyMode,

    pub nym_id: NymId,

    /// The master credential this credential chains to (the master's own
    /// ID for the master itself)
    pub master_id: Option<CredentialId>,

    /// Random bytes drawn at creation. Two credentials with the same
    /// content still get distinct IDs.
    #[serde(with = "crate::hex_serde::bytes")]
    pub nonce: Vec<u8>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<SerializedKey>,

    /// Identity source; present on master credentials only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SerializedNymIdSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_data: Option<ContactData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_set: Option<VerificationSet>,

    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl SerializedCredential {
    pub const VERSION: u32 = 1;

    /// Length of a freshly drawn nonce
    pub const NONCE_LEN: usize = 16;

    pub fn key(&self, role: KeyRole) -> Option<&SerializedKey> {
        self.keys.iter().find(|k| k.role == role)
    }

    /// Whether any wrapped private half is present
    pub fn has_private(&self) -> bool {
        self.keys.iter().any(|k| k.private.is_some())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, NymError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NymError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A whole credential set in index or full mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedCredentialSet {
    pub version: u32,

    pub nym_id: NymId,

    pub master_id: CredentialId,

    pub mode: CredentialSetMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_child_ids: Vec<CredentialId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revoked_child_ids: Vec<CredentialId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_credential: Option<SerializedCredential>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_children: Vec<SerializedCredential>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revoked_children: Vec<SerializedCredential>,
}

impl SerializedCredentialSet {
    pub const VERSION: u32 = 1;

    pub fn to_json(&self) -> Result<String, NymError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, NymError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key(private: Option<Vec<u8>>) -> SerializedKey {
        SerializedKey {
            role: KeyRole::Sign,
            algorithm: KeyAlgorithm::Dilithium3,
            public: vec![1, 2, 3],
            private,
        }
    }

    #[test]
    fn test_public_key_omits_private_field() {
        let json = serde_json::to_string(&sample_key(None)).unwrap();
        assert!(!json.contains("private"));

        let json = serde_json::to_string(&sample_key(Some(vec![9]))).unwrap();
        assert!(json.contains("\"private\":\"09\""));
    }

    #[test]
    fn test_source_nym_id_is_stable() {
        let source = SerializedNymIdSource {
            version: SerializedNymIdSource::VERSION,
            source_type: SourceType::PubKey,
            algorithm: KeyAlgorithm::Dilithium3,
            public_key: vec![7; 16],
        };
        assert_eq!(source.nym_id().unwrap(), source.clone().nym_id().unwrap());
    }

    #[test]
    fn test_index_set_json_roundtrip() {
        let set = SerializedCredentialSet {
            version: SerializedCredentialSet::VERSION,
            nym_id: NymId::digest(b"nym"),
            master_id: CredentialId::digest(b"master"),
            mode: CredentialSetMode::Index,
            active_child_ids: vec![CredentialId::digest(b"child")],
            revoked_child_ids: Vec::new(),
            master_credential: None,
            active_children: Vec::new(),
            revoked_children: Vec::new(),
        };

        let json = set.to_json().unwrap();
        assert!(!json.contains("master_credential"));
        assert_eq!(SerializedCredentialSet::from_json(&json).unwrap(), set);
    }
}
