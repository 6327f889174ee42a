//! Passphrase wrapping for private key halves
//!
//! A private half is sealed with XChaCha20-Poly1305 under a key derived
//! from the passphrase with Argon2id. The salt and cost parameters travel
//! in the header, so a wrapping opens with the passphrase alone.
//!
//! Wrapped layout (header authenticated as associated data):
//! ```text
//! version(1) || m_cost(4) || t_cost(4) || p_cost(4) || salt(16) || nonce(24) || ciphertext+tag(16)
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

const WRAP_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + 12 + SALT_LEN;

/// Upper bound on the memory cost accepted from a wrapped header (1 GiB)
const MAX_M_COST: u32 = 1 << 20;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KdfParams {
    /// Memory in KiB
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    /// 19 MiB, two passes, one lane
    fn default() -> Self {
        Self {
            m_cost: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    fn derive(&self, secret: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        if self.m_cost > MAX_M_COST {
            return Err(CryptoError::Kdf(format!("memory cost {} KiB too high", self.m_cost)));
        }
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, Some(32))
            .map_err(|e| CryptoError::Kdf(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(secret, salt, &mut key[..])
            .map_err(|e| CryptoError::Kdf(e.to_string()))?;
        Ok(key)
    }
}

type KeyCache = HashMap<(KdfParams, [u8; SALT_LEN]), Zeroizing<[u8; 32]>>;

/// A passphrase protecting wrapped private halves.
///
/// Each instance draws its own salt for the wrappings it produces and
/// caches derived keys per salt, so wrapping a whole credential set costs
/// one Argon2id run.
pub struct Passphrase {
    secret: Zeroizing<String>,
    params: KdfParams,
    salt: [u8; SALT_LEN],
    keys: Mutex<KeyCache>,
}

impl Passphrase {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self::with_params(passphrase, KdfParams::default())
    }

    pub fn with_params(passphrase: impl Into<String>, params: KdfParams) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        Self {
            secret: Zeroizing::new(passphrase.into()),
            params,
            salt,
            keys: Mutex::new(HashMap::new()),
        }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    fn key_for(&self, params: KdfParams, salt: [u8; SALT_LEN]) -> Result<Zeroizing<[u8; 32]>> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| CryptoError::Kdf("key cache poisoned".into()))?;

        if let Some(key) = keys.get(&(params, salt)) {
            return Ok(key.clone());
        }
        let key = params.derive(self.secret.as_bytes(), &salt)?;
        keys.insert((params, salt), key.clone());
        Ok(key)
    }
}

impl Clone for Passphrase {
    fn clone(&self) -> Self {
        let keys = self.keys.lock().map(|k| k.clone()).unwrap_or_default();
        Self {
            secret: self.secret.clone(),
            params: self.params,
            salt: self.salt,
            keys: Mutex::new(keys),
        }
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Passphrase([REDACTED], {:?})", self.params)
    }
}

fn encode_header(params: &KdfParams, salt: &[u8; SALT_LEN]) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = WRAP_VERSION;
    header[1..5].copy_from_slice(&params.m_cost.to_le_bytes());
    header[5..9].copy_from_slice(&params.t_cost.to_le_bytes());
    header[9..13].copy_from_slice(&params.p_cost.to_le_bytes());
    header[13..].copy_from_slice(salt);
    header
}

fn decode_header(header: &[u8]) -> Result<(KdfParams, [u8; SALT_LEN])> {
    if header[0] != WRAP_VERSION {
        return Err(CryptoError::Unwrap(format!("unknown wrap version {}", header[0])));
    }
    let word = |at: usize| {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&header[at..at + 4]);
        u32::from_le_bytes(bytes)
    };
    let params = KdfParams {
        m_cost: word(1),
        t_cost: word(5),
        p_cost: word(9),
    };
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&header[13..HEADER_LEN]);
    Ok((params, salt))
}

/// Wrap `plaintext` under `passphrase` with a fresh random nonce
pub fn wrap_secret(plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    let header = encode_header(&passphrase.params, &passphrase.salt);
    let key = passphrase.key_for(passphrase.params, passphrase.salt)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|e| CryptoError::Wrap(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Recover the plaintext produced by [`wrap_secret`]
pub fn unwrap_secret(data: &[u8], passphrase: &Passphrase) -> Result<Zeroizing<Vec<u8>>> {
    if data.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Unwrap("data too short".into()));
    }

    let (header, rest) = data.split_at(HEADER_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let (params, salt) = decode_header(header)?;
    let key = passphrase.key_for(params, salt)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| {
            CryptoError::Unwrap("authentication failed, wrong passphrase or corrupted key".into())
        })?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(passphrase: &str) -> Passphrase {
        Passphrase::with_params(
            passphrase,
            KdfParams {
                m_cost: 256,
                t_cost: 1,
                p_cost: 1,
            },
        )
    }

    #[test]
    fn test_wrap_unwrap() {
        let pass = fast("wallet-master");
        let plaintext = b"The quick brown fox jumps over the lazy dog, twice over";

        let wrapped = wrap_secret(plaintext, &pass).unwrap();
        let unwrapped = unwrap_secret(&wrapped, &pass).unwrap();

        assert_eq!(plaintext.as_slice(), unwrapped.as_slice());
    }

    #[test]
    fn test_wrong_passphrase_rejected() {
        let wrapped = wrap_secret(b"secret", &fast("correct")).unwrap();
        assert!(unwrap_secret(&wrapped, &fast("wrong")).is_err());
    }

    #[test]
    fn test_same_passphrase_text_uses_distinct_salts() {
        let a = fast("shared");
        let b = fast("shared");
        let wrapped_a = wrap_secret(b"secret", &a).unwrap();
        let wrapped_b = wrap_secret(b"secret", &b).unwrap();

        assert_ne!(wrapped_a[13..HEADER_LEN], wrapped_b[13..HEADER_LEN]);
        assert_ne!(a.key_for(a.params, a.salt).unwrap(), b.key_for(b.params, b.salt).unwrap());

        // Either instance opens the other's wrapping from the header alone
        assert_eq!(unwrap_secret(&wrapped_a, &b).unwrap().as_slice(), b"secret");
    }

    #[test]
    fn test_header_records_default_cost() {
        let pass = Passphrase::new("pass");
        let wrapped = wrap_secret(b"secret", &pass).unwrap();
        let (params, _) = decode_header(&wrapped[..HEADER_LEN]).unwrap();
        assert_eq!(params, KdfParams::default());
    }

    #[test]
    fn test_tampered_header_rejected() {
        let pass = fast("pass");
        let mut wrapped = wrap_secret(b"secret", &pass).unwrap();
        wrapped[HEADER_LEN - 1] ^= 0x01;
        assert!(unwrap_secret(&wrapped, &pass).is_err());
    }

    #[test]
    fn test_oversized_cost_rejected() {
        let pass = fast("pass");
        let mut wrapped = wrap_secret(b"secret", &pass).unwrap();
        wrapped[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(unwrap_secret(&wrapped, &pass), Err(CryptoError::Kdf(_))));
    }

    #[test]
    fn test_truncated_data_rejected() {
        assert!(unwrap_secret(&[0u8; 10], &fast("pass")).is_err());
    }
}
