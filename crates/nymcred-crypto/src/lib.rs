//! Nymcred Crypto
//!
//! Key material for the Nym credential trust chain.
//! Signing and authentication slots use Dilithium signatures (NIST ML-DSA),
//! encryption slots use X25519. Private halves are wrapped under a
//! passphrase whenever they leave memory.

pub mod agreement;
pub mod dilithium;
pub mod error;
pub mod keypair;
pub mod wrap;

pub use dilithium::{DilithiumKeypair, DilithiumPublicKey, DilithiumSignature};
pub use error::CryptoError;
pub use keypair::{Keypair, PrivateKey};
pub use wrap::{KdfParams, Passphrase};
