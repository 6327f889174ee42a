//! Dilithium signatures (NIST ML-DSA)
//!
//! Post-quantum secure detached signatures using the Dilithium algorithm.
//! Credentials store signatures apart from the signed bytes, so only the
//! detached API is exposed.

use pqcrypto_dilithium::dilithium3;
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};

/// Dilithium public key (Dilithium3 - NIST Level 3)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumPublicKey {
    bytes: Vec<u8>,
}

impl DilithiumPublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        dilithium3::PublicKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Verify a detached signature over `message`
    pub fn verify(&self, message: &[u8], signature: &DilithiumSignature) -> Result<()> {
        let pk = dilithium3::PublicKey::from_bytes(&self.bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = dilithium3::DetachedSignature::from_bytes(&signature.bytes)
            .map_err(|_| CryptoError::InvalidSignature)?;

        dilithium3::verify_detached_signature(&sig, message, &pk)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl std::fmt::Debug for DilithiumPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DilithiumPublicKey({} bytes)", self.bytes.len())
    }
}

/// Dilithium secret key (zeroed on drop)
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DilithiumSecretKey {
    bytes: Vec<u8>,
}

impl DilithiumSecretKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        dilithium3::SecretKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Get raw bytes (use carefully!)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Produce a detached signature over `message`
    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature> {
        let sk = dilithium3::SecretKey::from_bytes(&self.bytes)
            .map_err(|_| CryptoError::InvalidSecretKey)?;
        let sig = dilithium3::detached_sign(message, &sk);
        Ok(DilithiumSignature {
            bytes: sig.as_bytes().to_vec(),
        })
    }
}

impl std::fmt::Debug for DilithiumSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DilithiumSecretKey([REDACTED])")
    }
}

/// Detached Dilithium signature
#[derive(Clone, Serialize, Deserialize)]
pub struct DilithiumSignature {
    bytes: Vec<u8>,
}

impl DilithiumSignature {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for DilithiumSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DilithiumSignature({} bytes)", self.bytes.len())
    }
}

/// Dilithium keypair
pub struct DilithiumKeypair {
    pub public_key: DilithiumPublicKey,
    pub secret_key: DilithiumSecretKey,
}

impl DilithiumKeypair {
    /// Generate a new keypair
    pub fn generate() -> Self {
        let (pk, sk) = dilithium3::keypair();
        Self {
            public_key: DilithiumPublicKey {
                bytes: pk.as_bytes().to_vec(),
            },
            secret_key: DilithiumSecretKey {
                bytes: sk.as_bytes().to_vec(),
            },
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature> {
        self.secret_key.sign(message)
    }

    pub fn verify(&self, message: &[u8], signature: &DilithiumSignature) -> Result<()> {
        self.public_key.verify(message, signature)
    }
}

impl std::fmt::Debug for DilithiumKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DilithiumKeypair")
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = DilithiumKeypair::generate();
        let message = b"master credential public form";

        let signature = keypair.sign(message).unwrap();
        assert!(keypair.verify(message, &signature).is_ok());
    }

    #[test]
    fn test_verify_wrong_message() {
        let keypair = DilithiumKeypair::generate();

        let signature = keypair.sign(b"original").unwrap();
        assert!(keypair.verify(b"tampered", &signature).is_err());
    }

    #[test]
    fn test_verify_with_other_key_fails() {
        let signer = DilithiumKeypair::generate();
        let other = DilithiumKeypair::generate();

        let signature = signer.sign(b"payload").unwrap();
        assert!(other.verify(b"payload", &signature).is_err());
    }

    #[test]
    fn test_secret_key_roundtrips_through_bytes() {
        let keypair = DilithiumKeypair::generate();
        let restored = DilithiumSecretKey::from_bytes(keypair.secret_key.as_bytes()).unwrap();

        let signature = restored.sign(b"payload").unwrap();
        assert!(keypair.verify(b"payload", &signature).is_ok());
        assert!(DilithiumSecretKey::from_bytes(&[0u8; 4]).is_err());
    }
}
