//! Key pairs held by key credentials
//!
//! A [`Keypair`] always has a public half. The private half, when present,
//! is kept decrypted in memory next to its passphrase-wrapped form; only
//! the wrapped form is ever serialized.

use nymcred_core::{KeyAlgorithm, KeyMode, KeyRole, SerializedKey};
use zeroize::Zeroizing;

use crate::agreement;
use crate::dilithium::{DilithiumKeypair, DilithiumPublicKey, DilithiumSecretKey, DilithiumSignature};
use crate::error::{CryptoError, Result};
use crate::wrap::{unwrap_secret, wrap_secret, Passphrase};

/// Private half of a key pair
#[derive(Clone)]
pub struct PrivateKey {
    secret: Zeroizing<Vec<u8>>,
    wrapped: Vec<u8>,
}

impl PrivateKey {
    fn seal(secret: Zeroizing<Vec<u8>>, passphrase: &Passphrase) -> Result<Self> {
        let wrapped = wrap_secret(&secret, passphrase)?;
        Ok(Self { secret, wrapped })
    }

    /// Decrypt a wrapped private half
    pub fn unseal(wrapped: &[u8], passphrase: &Passphrase) -> Result<Self> {
        let secret = unwrap_secret(wrapped, passphrase)?;
        Ok(Self {
            secret,
            wrapped: wrapped.to_vec(),
        })
    }

    /// The passphrase-wrapped form
    pub fn wrapped(&self) -> &[u8] {
        &self.wrapped
    }

    /// Raw secret bytes (use carefully!)
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Re-wrap the secret under a new passphrase
    pub fn rewrap(&mut self, passphrase: &Passphrase) -> Result<()> {
        self.wrapped = wrap_secret(&self.secret, passphrase)?;
        Ok(())
    }

    /// Whether the current wrapping opens under `passphrase`
    pub fn is_wrapped_under(&self, passphrase: &Passphrase) -> bool {
        unwrap_secret(&self.wrapped, passphrase)
            .map(|s| s.as_slice() == self.secret.as_slice())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey([REDACTED], {} wrapped bytes)", self.wrapped.len())
    }
}

/// Public half plus optional private half of one key slot
#[derive(Clone, Debug)]
pub struct Keypair {
    algorithm: KeyAlgorithm,
    public: Vec<u8>,
    private: Option<PrivateKey>,
}

impl Keypair {
    /// Generate a key pair whose private half is wrapped under `passphrase`
    pub fn generate(algorithm: KeyAlgorithm, passphrase: &Passphrase) -> Result<Self> {
        let (public, secret) = match algorithm {
            KeyAlgorithm::Dilithium3 => {
                let kp = DilithiumKeypair::generate();
                (
                    kp.public_key.as_bytes().to_vec(),
                    Zeroizing::new(kp.secret_key.as_bytes().to_vec()),
                )
            }
            KeyAlgorithm::X25519 => {
                let (public, secret) = agreement::generate();
                (public.to_vec(), secret)
            }
        };

        Ok(Self {
            algorithm,
            public,
            private: Some(PrivateKey::seal(secret, passphrase)?),
        })
    }

    /// Rebuild a key pair from its serialized slot.
    ///
    /// The private half is unwrapped only when a passphrase is supplied;
    /// without one the key pair is public-only.
    pub fn from_serialized(key: &SerializedKey, passphrase: Option<&Passphrase>) -> Result<Self> {
        check_public(key.algorithm, &key.public)?;

        let private = match (&key.private, passphrase) {
            (Some(wrapped), Some(passphrase)) => {
                let private = PrivateKey::unseal(wrapped, passphrase)?;
                check_pair(key.algorithm, &key.public, private.secret())?;
                Some(private)
            }
            _ => None,
        };

        Ok(Self {
            algorithm: key.algorithm,
            public: key.public.clone(),
            private,
        })
    }

    /// Serialize as slot `role`; private mode includes the wrapped half
    pub fn to_serialized(&self, role: KeyRole, mode: KeyMode) -> SerializedKey {
        let private = match mode {
            KeyMode::Private => self.private.as_ref().map(|p| p.wrapped().to_vec()),
            KeyMode::Public => None,
        };

        SerializedKey {
            role,
            algorithm: self.algorithm,
            public: self.public.clone(),
            private,
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public
    }

    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private.as_ref()
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Whether this key pair can currently produce signatures
    pub fn can_sign(&self) -> bool {
        self.algorithm.can_sign() && self.has_private()
    }

    /// Copy of this key pair without its private half
    pub fn public_only(&self) -> Self {
        Self {
            algorithm: self.algorithm,
            public: self.public.clone(),
            private: None,
        }
    }

    /// Produce a detached signature over `message`
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        if !self.algorithm.can_sign() {
            return Err(CryptoError::SigningUnsupported(self.algorithm));
        }
        let private = self.private.as_ref().ok_or(CryptoError::MissingPrivateKey)?;
        let sk = DilithiumSecretKey::from_bytes(private.secret())?;
        Ok(sk.sign(message)?.into_bytes())
    }

    /// Verify a detached signature over `message` with the public half
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        if !self.algorithm.can_sign() {
            return Err(CryptoError::SigningUnsupported(self.algorithm));
        }
        let pk = DilithiumPublicKey::from_bytes(&self.public)?;
        pk.verify(message, &DilithiumSignature::from_bytes(signature))
    }

    /// X25519 agreement with a peer public key (encryption slots only)
    pub fn agree(&self, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        if self.algorithm != KeyAlgorithm::X25519 {
            return Err(CryptoError::AgreementUnsupported(self.algorithm));
        }
        let private = self.private.as_ref().ok_or(CryptoError::MissingPrivateKey)?;
        agreement::diffie_hellman(private.secret(), peer_public)
    }

    /// Re-wrap the private half under a new passphrase
    pub fn re_encrypt(&mut self, passphrase: &Passphrase) -> Result<()> {
        let private = self.private.as_mut().ok_or(CryptoError::MissingPrivateKey)?;
        private.rewrap(passphrase)
    }
}

fn check_public(algorithm: KeyAlgorithm, public: &[u8]) -> Result<()> {
    match algorithm {
        KeyAlgorithm::Dilithium3 => DilithiumPublicKey::from_bytes(public).map(|_| ()),
        KeyAlgorithm::X25519 if public.len() == 32 => Ok(()),
        KeyAlgorithm::X25519 => Err(CryptoError::InvalidPublicKey),
    }
}

fn check_pair(algorithm: KeyAlgorithm, public: &[u8], secret: &[u8]) -> Result<()> {
    match algorithm {
        KeyAlgorithm::Dilithium3 => DilithiumSecretKey::from_bytes(secret).map(|_| ()),
        KeyAlgorithm::X25519 => {
            if agreement::public_from_secret(secret)?.as_slice() == public {
                Ok(())
            } else {
                Err(CryptoError::InvalidSecretKey)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_keypair_signs() {
        let pass = Passphrase::new("pass");
        let kp = Keypair::generate(KeyAlgorithm::Dilithium3, &pass).unwrap();

        assert!(kp.can_sign());
        let sig = kp.sign(b"message").unwrap();
        assert!(kp.verify(b"message", &sig).is_ok());
        assert!(kp.public_only().verify(b"message", &sig).is_ok());
        assert!(kp.public_only().sign(b"message").is_err());
    }

    #[test]
    fn test_encryption_keypair_cannot_sign() {
        let pass = Passphrase::new("pass");
        let kp = Keypair::generate(KeyAlgorithm::X25519, &pass).unwrap();

        assert!(!kp.can_sign());
        assert!(matches!(
            kp.sign(b"message"),
            Err(CryptoError::SigningUnsupported(KeyAlgorithm::X25519))
        ));
    }

    #[test]
    fn test_agreement_between_encryption_keys() {
        let pass = Passphrase::new("pass");
        let alice = Keypair::generate(KeyAlgorithm::X25519, &pass).unwrap();
        let bob = Keypair::generate(KeyAlgorithm::X25519, &pass).unwrap();

        let ab = alice.agree(bob.public_key()).unwrap();
        let ba = bob.agree(alice.public_key()).unwrap();
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn test_serialized_private_requires_passphrase() {
        let pass = Passphrase::new("pass");
        let kp = Keypair::generate(KeyAlgorithm::Dilithium3, &pass).unwrap();
        let slot = kp.to_serialized(KeyRole::Sign, KeyMode::Private);

        let public_only = Keypair::from_serialized(&slot, None).unwrap();
        assert!(!public_only.has_private());

        let restored = Keypair::from_serialized(&slot, Some(&pass)).unwrap();
        assert!(restored.can_sign());

        assert!(Keypair::from_serialized(&slot, Some(&Passphrase::new("nope"))).is_err());
    }

    #[test]
    fn test_re_encrypt_moves_wrapping() {
        let old = Passphrase::new("old");
        let new = Passphrase::new("new");
        let mut kp = Keypair::generate(KeyAlgorithm::X25519, &old).unwrap();

        kp.re_encrypt(&new).unwrap();

        let private = kp.private_key().unwrap();
        assert!(private.is_wrapped_under(&new));
        assert!(!private.is_wrapped_under(&old));
        assert!(kp.public_only().re_encrypt(&new).is_err());
    }
}
