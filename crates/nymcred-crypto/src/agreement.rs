//! X25519 key agreement for encryption key slots

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

/// Generate a fresh X25519 key pair as `(public, secret)` bytes
pub fn generate() -> ([u8; 32], Zeroizing<Vec<u8>>) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    (public.to_bytes(), Zeroizing::new(secret.to_bytes().to_vec()))
}

fn static_secret(secret: &[u8]) -> Result<StaticSecret> {
    let bytes: [u8; 32] = secret
        .try_into()
        .map_err(|_| CryptoError::InvalidSecretKey)?;
    Ok(StaticSecret::from(bytes))
}

/// Derive the public half belonging to `secret`
pub fn public_from_secret(secret: &[u8]) -> Result<[u8; 32]> {
    Ok(PublicKey::from(&static_secret(secret)?).to_bytes())
}

/// Compute the shared secret between `secret` and a peer's public key
pub fn diffie_hellman(secret: &[u8], peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let peer: [u8; 32] = peer_public
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let shared = static_secret(secret)?.diffie_hellman(&PublicKey::from(peer));
    Ok(Zeroizing::new(shared.to_bytes()))
}
