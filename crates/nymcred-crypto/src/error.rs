//! Error type for key operations

use nymcred_core::{KeyAlgorithm, NymError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid secret key")]
    InvalidSecretKey,

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("{0:?} keys can not sign")]
    SigningUnsupported(KeyAlgorithm),

    #[error("{0:?} keys can not perform key agreement")]
    AgreementUnsupported(KeyAlgorithm),

    #[error("Key pair holds no private half")]
    MissingPrivateKey,

    #[error("Key derivation failed: {0}")]
    Kdf(String),

    #[error("Wrap failed: {0}")]
    Wrap(String),

    #[error("Unwrap failed: {0}")]
    Unwrap(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

impl From<CryptoError> for NymError {
    fn from(err: CryptoError) -> Self {
        NymError::Crypto(err.to_string())
    }
}
