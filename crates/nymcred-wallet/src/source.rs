//! Nym identity sources
//!
//! The source is what a Nym ID commits to. It also produces the
//! signature that anchors the master credential, a scheme distinct from
//! ordinary credential-to-credential signing.
//!
//! A public-key source shares its key with the master's signing slot, so
//! a master loaded with its private halves yields a source that can sign.

use nymcred_core::{
    CredentialRole, KeyRole, NymError, NymId, SerializedNymIdSource, Signature, SignatureRole,
    SourceType,
};
use nymcred_crypto::{Keypair, Passphrase};

use crate::credential::Credential;
use crate::params::NymParameters;

/// Identity source backed by a dedicated public key
#[derive(Debug, Clone)]
pub struct NymIdSource {
    source_type: SourceType,
    key: Keypair,
}

impl NymIdSource {
    /// Generate a fresh source key
    pub fn generate(params: &NymParameters, passphrase: &Passphrase) -> Result<Self, NymError> {
        params.validate()?;
        Ok(Self {
            source_type: params.source_type,
            key: Keypair::generate(params.key_algorithm, passphrase)?,
        })
    }

    /// Recover the source from a master credential's signing slot.
    ///
    /// The result can sign whenever the master was loaded with its
    /// private halves.
    pub fn from_master(master: &Credential) -> Result<Self, NymError> {
        let embedded = master.source().ok_or_else(|| {
            NymError::InvalidCredential(format!("master {} has no source", master.id()))
        })?;
        let key = master.keypair(KeyRole::Sign).ok_or_else(|| {
            NymError::InvalidCredential(format!("master {} has no signing key", master.id()))
        })?;

        let source = Self {
            source_type: embedded.source_type,
            key: key.clone(),
        };
        if source.serialize() != *embedded {
            return Err(NymError::InvalidCredential(format!(
                "source of master {} is not its signing key",
                master.id()
            )));
        }
        Ok(source)
    }

    /// Rebuild a verify-only source from its public form
    pub fn from_serialized(serialized: &SerializedNymIdSource) -> Result<Self, NymError> {
        let key = Keypair::from_serialized(
            &nymcred_core::SerializedKey {
                role: KeyRole::Sign,
                algorithm: serialized.algorithm,
                public: serialized.public_key.clone(),
                private: None,
            },
            None,
        )?;

        Ok(Self {
            source_type: serialized.source_type,
            key,
        })
    }

    pub fn serialize(&self) -> SerializedNymIdSource {
        SerializedNymIdSource {
            version: SerializedNymIdSource::VERSION,
            source_type: self.source_type,
            algorithm: self.key.algorithm(),
            public_key: self.key.public_key().to_vec(),
        }
    }

    /// The Nym ID derived from this source
    pub fn nym_id(&self) -> Result<NymId, NymError> {
        self.serialize().nym_id()
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn key(&self) -> &Keypair {
        &self.key
    }

    /// Whether this source still holds its private key
    pub fn can_sign(&self) -> bool {
        self.key.can_sign()
    }

    /// Sign a master credential's public form
    pub fn sign(&self, params: &NymParameters, master: &Credential) -> Result<Signature, NymError> {
        if params.source_type != self.source_type {
            return Err(NymError::Config(format!(
                "source type {:?} does not match parameters {:?}",
                self.source_type, params.source_type
            )));
        }
        if master.role() != CredentialRole::MasterKey {
            return Err(NymError::InvalidCredential(format!(
                "source can only sign master credentials, got {}",
                master.role().as_str()
            )));
        }

        let bytes = self.key.sign(&master.public_signing_bytes()?)?;
        Ok(Signature::new(SignatureRole::NymIdSource, master.id(), bytes))
    }

    /// Verify a source signature over a master credential's public form
    pub fn verify(&self, master: &Credential, signature: &Signature) -> Result<(), NymError> {
        if signature.role != SignatureRole::NymIdSource || signature.credential_id != master.id() {
            return Err(NymError::InvalidSignature);
        }
        self.key
            .verify(&master.public_signing_bytes()?, &signature.bytes)
            .map_err(|_| NymError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nym_id_survives_serialization() {
        let source = NymIdSource::generate(&NymParameters::default(), &Passphrase::new("pw")).unwrap();
        let restored = NymIdSource::from_serialized(&source.serialize()).unwrap();

        assert_eq!(source.nym_id().unwrap(), restored.nym_id().unwrap());
        assert!(source.can_sign());
        assert!(!restored.can_sign());
    }

    #[test]
    fn test_distinct_sources_have_distinct_ids() {
        let pass = Passphrase::new("pw");
        let a = NymIdSource::generate(&NymParameters::default(), &pass).unwrap();
        let b = NymIdSource::generate(&NymParameters::default(), &pass).unwrap();
        assert_ne!(a.nym_id().unwrap(), b.nym_id().unwrap());
    }
}
