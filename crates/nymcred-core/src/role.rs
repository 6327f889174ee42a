//! Role tags for credentials, signatures and keys

use serde::{Deserialize, Serialize};

/// The four credential variants of a Nym
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialRole {
    /// Self-signed trust anchor
    MasterKey,
    /// Functional authentication / signing / encryption keys
    ChildKey,
    /// Signed contact metadata
    Contact,
    /// Signed third-party verification claims
    Verification,
}

impl CredentialRole {
    /// Whether credentials of this role carry key pairs
    pub fn has_keys(&self) -> bool {
        matches!(self, CredentialRole::MasterKey | CredentialRole::ChildKey)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialRole::MasterKey => "master",
            CredentialRole::ChildKey => "child_key",
            CredentialRole::Contact => "contact",
            CredentialRole::Verification => "verification",
        }
    }
}

/// What a signature attests to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureRole {
    /// Master signature over another credential's public form
    PublicCredential,
    /// Self-signature over a credential's private form
    PrivateCredential,
    /// Identity-source signature over the master credential
    NymIdSource,
    /// Signature over a contact claim
    Claim,
    /// Signature over a verification record
    Verification,
    ServerContract,
    PeerRequest,
}

/// The three functional key slots of a key credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    Auth,
    Sign,
    Encrypt,
}

/// Asymmetric algorithms available for key slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAlgorithm {
    /// Dilithium level 3 (NIST security level 3) signatures
    Dilithium3,
    /// X25519 key agreement
    X25519,
}

impl KeyAlgorithm {
    /// Whether keys of this algorithm can produce signatures
    pub fn can_sign(&self) -> bool {
        matches!(self, KeyAlgorithm::Dilithium3)
    }
}

/// How a Nym ID is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Nym ID is the hash of a dedicated source public key
    PubKey,
}
