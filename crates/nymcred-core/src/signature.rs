//! Signatures attached to credentials and signed records

use serde::{Deserialize, Serialize};

use crate::id::CredentialId;
use crate::role::SignatureRole;

/// A detached signature together with the credential that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub version: u32,

    /// What this signature attests to
    pub role: SignatureRole,

    /// Credential whose key produced the signature
    pub credential_id: CredentialId,

    /// The signature bytes (Dilithium3 detached signatures are ~3.3 KB)
    #[serde(with = "crate::hex_serde::bytes")]
    pub bytes: Vec<u8>,
}

impl Signature {
    pub const VERSION: u32 = 1;

    pub fn new(role: SignatureRole, credential_id: CredentialId, bytes: Vec<u8>) -> Self {
        Self {
            version: Self::VERSION,
            role,
            credential_id,
            bytes,
        }
    }

    /// Private signatures cover wrapped key material and must never
    /// appear in a public form.
    pub fn is_private(&self) -> bool {
        self.role == SignatureRole::PrivateCredential
    }
}
