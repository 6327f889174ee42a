//! Nymcred Core
//!
//! Core data model for the Nym credential trust chain.
//! This crate defines the plain data structures shared by the key,
//! storage and credential-set crates: identifiers, roles, signatures,
//! contact and verification payloads, and the serialized forms that
//! travel through the credential store.

pub mod contact;
pub mod error;
mod hex_serde;
pub mod id;
pub mod role;
pub mod serialized;
pub mod signature;
pub mod verification;

pub use contact::{ContactData, ContactItem, ContactSection};
pub use error::NymError;
pub use id::{CredentialId, NymId};
pub use role::{CredentialRole, KeyAlgorithm, KeyRole, SignatureRole, SourceType};
pub use serialized::{
    CredentialSetMode, KeyMode, SerializedCredential, SerializedCredentialSet, SerializedKey,
    SerializedNymIdSource,
};
pub use signature::Signature;
pub use verification::{Verification, VerificationGroup, VerificationSet};
