//! Error types for the credential trust chain

use thiserror::Error;

use crate::role::{KeyRole, SignatureRole};

/// Main error type for credential-set operations
#[derive(Error, Debug)]
pub enum NymError {
    #[error("Credential set has no master credential")]
    MissingMaster,

    #[error("No child credential holds private signing material")]
    NoSigningCredential,

    #[error("No eligible {0:?} key pair and master key fallback is disabled")]
    NoEligibleKey(KeyRole),

    #[error("Signature role {0:?} can not be produced by a credential set")]
    UnsupportedSignatureRole(SignatureRole),

    #[error("Master credentials only sign other credentials")]
    MasterSignsContent,

    #[error("Signer {0} is not part of this credential set")]
    UnknownSigner(String),

    #[error("Credential {credential_id} failed validation: {reason}")]
    ValidationFailed {
        credential_id: String,
        reason: String,
    },

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Credential ID mismatch: expected {expected}, computed {actual}")]
    IdMismatch { expected: String, actual: String },

    #[error("Nym ID mismatch: expected {expected}, found {actual}")]
    NymIdMismatch { expected: String, actual: String },

    #[error("Credential {0} is already part of this set")]
    DuplicateCredential(String),

    #[error("Credential {0} holds no private key material")]
    NoPrivateMaterial(String),

    #[error("Failed to re-encrypt credential {credential_id}: {reason}")]
    ReEncryption {
        credential_id: String,
        reason: String,
    },

    #[error("Failed to re-sign credential {credential_id}: {reason}")]
    ReSigning {
        credential_id: String,
        reason: String,
    },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for NymError {
    fn from(err: serde_json::Error) -> Self {
        NymError::Serialization(err.to_string())
    }
}
