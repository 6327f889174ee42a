//! Nymcred Wallet
//!
//! The credential trust chain of a Nym.
//!
//! A Nym is identified by the digest of its identity source. The source
//! signs a master credential; the master signs child credentials carrying
//! working keys, contact data or third-party verification claims. A
//! [`CredentialSet`] owns that hierarchy and is the entry point for key
//! lookup, signing, verification, revocation, serialization and
//! re-encryption on export and import.

mod armor;
pub mod config;
pub mod credential;
pub mod export;
pub mod params;
pub mod reencrypt;
pub mod set;
pub mod source;

pub use config::CredentialSetConfig;
pub use credential::{Credential, CredentialBody, KeySet};
pub use export::{CredentialIndexExport, ExportEntry, ExportEntryKind, ExportOptions};
pub use params::NymParameters;
pub use reencrypt::{ReEncryptMode, ReEncryptOutcome};
pub use set::CredentialSet;
pub use source::NymIdSource;

pub use nymcred_core::NymError;
pub use nymcred_crypto::{KdfParams, Passphrase};
