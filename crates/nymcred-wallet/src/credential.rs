//! Credentials of a Nym
//!
//! A credential is one of four closed variants. The master credential is
//! anchored by the Nym's identity source; every other credential is
//! signed by the master. Key credentials (master and child key) also
//! carry a self-signature over their private form while they hold
//! private key material.

use nymcred_core::{
    ContactData, CredentialId, CredentialRole, KeyMode, KeyRole, NymError, NymId,
    SerializedCredential, SerializedKey, SerializedNymIdSource, Signature, SignatureRole,
    VerificationSet,
};
use nymcred_crypto::{Keypair, Passphrase};
use rand::RngCore;

use crate::armor;
use crate::params::NymParameters;
use crate::source::NymIdSource;

/// The authentication, signing and encryption key pairs of a key credential
#[derive(Debug, Clone)]
pub struct KeySet {
    pub auth: Keypair,
    pub sign: Keypair,
    pub encrypt: Keypair,
}

impl KeySet {
    fn generate(params: &NymParameters, passphrase: &Passphrase) -> Result<Self, NymError> {
        Ok(Self {
            auth: Keypair::generate(params.key_algorithm, passphrase)?,
            sign: Keypair::generate(params.key_algorithm, passphrase)?,
            encrypt: Keypair::generate(params.encryption_algorithm, passphrase)?,
        })
    }

    /// Master key set: the source key becomes the signing slot
    fn for_master(
        params: &NymParameters,
        source: &NymIdSource,
        passphrase: &Passphrase,
    ) -> Result<Self, NymError> {
        if !source.can_sign() {
            return Err(NymError::NoPrivateMaterial("identity source".into()));
        }
        let mut sign = source.key().clone();
        sign.re_encrypt(passphrase)?;

        Ok(Self {
            auth: Keypair::generate(params.key_algorithm, passphrase)?,
            sign,
            encrypt: Keypair::generate(params.encryption_algorithm, passphrase)?,
        })
    }

    fn from_serialized(
        keys: &[SerializedKey],
        passphrase: Option<&Passphrase>,
    ) -> Result<Self, NymError> {
        let slot = |role: KeyRole| -> Result<Keypair, NymError> {
            let key = keys.iter().find(|k| k.role == role).ok_or_else(|| {
                NymError::InvalidCredential(format!("missing {:?} key", role))
            })?;
            Ok(Keypair::from_serialized(key, passphrase)?)
        };

        Ok(Self {
            auth: slot(KeyRole::Auth)?,
            sign: slot(KeyRole::Sign)?,
            encrypt: slot(KeyRole::Encrypt)?,
        })
    }

    fn to_serialized(&self, mode: KeyMode) -> Vec<SerializedKey> {
        vec![
            self.auth.to_serialized(KeyRole::Auth, mode),
            self.sign.to_serialized(KeyRole::Sign, mode),
            self.encrypt.to_serialized(KeyRole::Encrypt, mode),
        ]
    }

    pub fn get(&self, role: KeyRole) -> &Keypair {
        match role {
            KeyRole::Auth => &self.auth,
            KeyRole::Sign => &self.sign,
            KeyRole::Encrypt => &self.encrypt,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypair> {
        [&self.auth, &self.sign, &self.encrypt].into_iter()
    }

    pub fn has_private(&self) -> bool {
        self.iter().any(Keypair::has_private)
    }

    fn re_encrypt(&mut self, passphrase: &Passphrase) -> Result<(), NymError> {
        for keypair in [&mut self.auth, &mut self.sign, &mut self.encrypt] {
            if keypair.has_private() {
                keypair.re_encrypt(passphrase)?;
            }
        }
        Ok(())
    }
}

/// Role-specific content of a credential
#[derive(Debug, Clone)]
pub enum CredentialBody {
    Master {
        keys: KeySet,
        source: SerializedNymIdSource,
    },
    ChildKey {
        keys: KeySet,
    },
    Contact {
        data: ContactData,
    },
    Verification {
        set: VerificationSet,
    },
}

/// A single credential of a Nym
#[derive(Debug, Clone)]
pub struct Credential {
    version: u32,
    id: CredentialId,
    nym_id: NymId,
    master_id: CredentialId,
    nonce: Vec<u8>,
    body: CredentialBody,
    signatures: Vec<Signature>,
}

fn fresh_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; SerializedCredential::NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

impl Credential {
    pub const VERSION: u32 = 1;

    /// Generate a master credential anchored by `source`
    pub fn new_master(
        params: &NymParameters,
        source: &NymIdSource,
        passphrase: &Passphrase,
    ) -> Result<Self, NymError> {
        params.validate()?;

        let mut credential = Self {
            version: Self::VERSION,
            id: CredentialId::from_bytes([0; 32]),
            nym_id: source.nym_id()?,
            master_id: CredentialId::from_bytes([0; 32]),
            nonce: fresh_nonce(),
            body: CredentialBody::Master {
                keys: KeySet::for_master(params, source, passphrase)?,
                source: source.serialize(),
            },
            signatures: Vec::new(),
        };
        credential.id = credential.compute_id()?;
        credential.master_id = credential.id;

        let source_signature = source.sign(params, &credential)?;
        credential.signatures.push(source_signature);
        credential.self_sign()?;

        tracing::debug!(
            "Generated master credential {} for Nym {}",
            credential.id,
            credential.nym_id
        );
        Ok(credential)
    }

    /// Generate a child key credential signed by `master`
    pub fn new_child_key(
        params: &NymParameters,
        master: &Credential,
        passphrase: &Passphrase,
    ) -> Result<Self, NymError> {
        params.validate()?;
        let keys = KeySet::generate(params, passphrase)?;
        Self::signed_by_master(CredentialBody::ChildKey { keys }, master)
    }

    /// Wrap contact data in a credential signed by `master`
    pub fn new_contact(data: ContactData, master: &Credential) -> Result<Self, NymError> {
        Self::signed_by_master(CredentialBody::Contact { data }, master)
    }

    /// Wrap a verification set in a credential signed by `master`
    pub fn new_verification(set: VerificationSet, master: &Credential) -> Result<Self, NymError> {
        Self::signed_by_master(CredentialBody::Verification { set }, master)
    }

    fn signed_by_master(body: CredentialBody, master: &Credential) -> Result<Self, NymError> {
        if master.role() != CredentialRole::MasterKey {
            return Err(NymError::InvalidCredential(format!(
                "{} is not a master credential",
                master.id
            )));
        }

        let mut credential = Self {
            version: Self::VERSION,
            id: CredentialId::from_bytes([0; 32]),
            nym_id: master.nym_id,
            master_id: master.id,
            nonce: fresh_nonce(),
            body,
            signatures: Vec::new(),
        };
        credential.id = credential.compute_id()?;

        let master_signature = master.sign(
            &credential.public_signing_bytes()?,
            SignatureRole::PublicCredential,
            KeyRole::Sign,
        )?;
        credential.signatures.push(master_signature);

        if credential.has_private_data() {
            credential.self_sign()?;
        }

        tracing::debug!(
            "Created {} credential {} under master {}",
            credential.role().as_str(),
            credential.id,
            master.id
        );
        Ok(credential)
    }

    /// Rebuild a credential from its serialized form.
    ///
    /// Private halves are unwrapped only when `passphrase` is given; a
    /// credential loaded without one is public-only and drops its private
    /// signatures.
    pub fn from_serialized(
        serialized: &SerializedCredential,
        passphrase: Option<&Passphrase>,
    ) -> Result<Self, NymError> {
        let id = serialized
            .id
            .ok_or_else(|| NymError::InvalidCredential("credential has no ID".into()))?;
        let master_id = serialized.master_id.ok_or_else(|| {
            NymError::InvalidCredential(format!("credential {} has no master ID", id))
        })?;

        let body = match serialized.role {
            CredentialRole::MasterKey => CredentialBody::Master {
                keys: KeySet::from_serialized(&serialized.keys, passphrase)?,
                source: serialized.source.clone().ok_or_else(|| {
                    NymError::InvalidCredential(format!("master {} has no source", id))
                })?,
            },
            CredentialRole::ChildKey => CredentialBody::ChildKey {
                keys: KeySet::from_serialized(&serialized.keys, passphrase)?,
            },
            CredentialRole::Contact => CredentialBody::Contact {
                data: serialized.contact_data.clone().ok_or_else(|| {
                    NymError::InvalidCredential(format!("contact {} has no contact data", id))
                })?,
            },
            CredentialRole::Verification => CredentialBody::Verification {
                set: serialized.verification_set.clone().ok_or_else(|| {
                    NymError::InvalidCredential(format!("verification {} has no claims", id))
                })?,
            },
        };

        let mut credential = Self {
            version: serialized.version,
            id,
            nym_id: serialized.nym_id,
            master_id,
            nonce: serialized.nonce.clone(),
            body,
            signatures: serialized.signatures.clone(),
        };
        if !credential.has_private_data() {
            credential.release_signatures(true);
        }

        let computed = credential.compute_id()?;
        if computed != id {
            return Err(NymError::IdMismatch {
                expected: id.to_hex(),
                actual: computed.to_hex(),
            });
        }
        if serialized.role == CredentialRole::MasterKey && master_id != id {
            return Err(NymError::InvalidCredential(format!(
                "master {} records foreign master ID {}",
                id, master_id
            )));
        }

        Ok(credential)
    }

    pub fn id(&self) -> CredentialId {
        self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn role(&self) -> CredentialRole {
        match self.body {
            CredentialBody::Master { .. } => CredentialRole::MasterKey,
            CredentialBody::ChildKey { .. } => CredentialRole::ChildKey,
            CredentialBody::Contact { .. } => CredentialRole::Contact,
            CredentialBody::Verification { .. } => CredentialRole::Verification,
        }
    }

    pub fn nym_id(&self) -> NymId {
        self.nym_id
    }

    pub fn master_id(&self) -> CredentialId {
        self.master_id
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn body(&self) -> &CredentialBody {
        &self.body
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn keys(&self) -> Option<&KeySet> {
        match &self.body {
            CredentialBody::Master { keys, .. } | CredentialBody::ChildKey { keys } => Some(keys),
            _ => None,
        }
    }

    fn keys_mut(&mut self) -> Option<&mut KeySet> {
        match &mut self.body {
            CredentialBody::Master { keys, .. } | CredentialBody::ChildKey { keys } => Some(keys),
            _ => None,
        }
    }

    pub fn keypair(&self, role: KeyRole) -> Option<&Keypair> {
        self.keys().map(|keys| keys.get(role))
    }

    /// Identity source embedded in a master credential
    pub fn source(&self) -> Option<&SerializedNymIdSource> {
        match &self.body {
            CredentialBody::Master { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn contact_data(&self) -> Option<&ContactData> {
        match &self.body {
            CredentialBody::Contact { data } => Some(data),
            _ => None,
        }
    }

    pub fn verification_set(&self) -> Option<&VerificationSet> {
        match &self.body {
            CredentialBody::Verification { set } => Some(set),
            _ => None,
        }
    }

    pub fn has_private_data(&self) -> bool {
        self.keys().map(KeySet::has_private).unwrap_or(false)
    }

    /// Whether this credential can produce signatures right now
    pub fn can_sign(&self) -> bool {
        self.keypair(KeyRole::Sign)
            .map(Keypair::can_sign)
            .unwrap_or(false)
    }

    /// Serialize in `mode`; private mode falls back to public for
    /// credentials without private data. Public forms never carry
    /// private signatures.
    pub fn as_serialized(&self, mode: KeyMode, with_signatures: bool) -> SerializedCredential {
        let mode = if mode == KeyMode::Private && self.has_private_data() {
            KeyMode::Private
        } else {
            KeyMode::Public
        };

        let signatures = if with_signatures {
            self.signatures
                .iter()
                .filter(|s| mode == KeyMode::Private || !s.is_private())
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        let (keys, source, contact_data, verification_set) = match &self.body {
            CredentialBody::Master { keys, source } => {
                (keys.to_serialized(mode), Some(source.clone()), None, None)
            }
            CredentialBody::ChildKey { keys } => (keys.to_serialized(mode), None, None, None),
            CredentialBody::Contact { data } => (Vec::new(), None, Some(data.clone()), None),
            CredentialBody::Verification { set } => (Vec::new(), None, None, Some(set.clone())),
        };

        SerializedCredential {
            version: self.version,
            id: Some(self.id),
            role: self.role(),
            mode,
            nym_id: self.nym_id,
            master_id: Some(self.master_id),
            nonce: self.nonce.clone(),
            keys,
            source,
            contact_data,
            verification_set,
            signatures,
        }
    }

    /// Armored text form
    pub fn as_string(&self, private: bool) -> Result<String, NymError> {
        let mode = if private {
            KeyMode::Private
        } else {
            KeyMode::Public
        };
        armor::encode(&self.as_serialized(mode, true))
    }

    fn compute_id(&self) -> Result<CredentialId, NymError> {
        let mut form = self.as_serialized(KeyMode::Public, false);
        form.id = None;
        if self.role() == CredentialRole::MasterKey {
            form.master_id = None;
        }
        Ok(CredentialId::digest(&form.to_bytes()?))
    }

    /// Bytes covered by master and source signatures
    pub fn public_signing_bytes(&self) -> Result<Vec<u8>, NymError> {
        self.as_serialized(KeyMode::Public, false).to_bytes()
    }

    fn private_signing_bytes(&self) -> Result<Vec<u8>, NymError> {
        self.as_serialized(KeyMode::Private, false).to_bytes()
    }

    /// Sign `plaintext` with key slot `key`
    pub fn sign(
        &self,
        plaintext: &[u8],
        role: SignatureRole,
        key: KeyRole,
    ) -> Result<Signature, NymError> {
        let keypair = self.keypair(key).ok_or_else(|| {
            NymError::InvalidCredential(format!("credential {} carries no keys", self.id))
        })?;
        let bytes = keypair.sign(plaintext)?;
        Ok(Signature::new(role, self.id, bytes))
    }

    /// Verify a signature this credential claims to have produced
    pub fn verify(
        &self,
        plaintext: &[u8],
        signature: &Signature,
        key: KeyRole,
    ) -> Result<(), NymError> {
        if signature.credential_id != self.id {
            return Err(NymError::UnknownSigner(signature.credential_id.to_hex()));
        }
        let keypair = self.keypair(key).ok_or_else(|| {
            NymError::InvalidCredential(format!("credential {} carries no keys", self.id))
        })?;
        keypair
            .verify(plaintext, &signature.bytes)
            .map_err(|_| NymError::InvalidSignature)
    }

    /// Drop private signatures, or every signature
    pub fn release_signatures(&mut self, private_only: bool) {
        if private_only {
            self.signatures.retain(|s| !s.is_private());
        } else {
            self.signatures.clear();
        }
    }

    /// (Re)create the self-signature over the private form
    pub fn self_sign(&mut self) -> Result<(), NymError> {
        if !self.can_sign() {
            return Err(NymError::NoPrivateMaterial(self.id.to_hex()));
        }
        self.release_signatures(true);
        let signature = self.sign(
            &self.private_signing_bytes()?,
            SignatureRole::PrivateCredential,
            KeyRole::Sign,
        )?;
        self.signatures.push(signature);
        Ok(())
    }

    /// Check the private self-signature against the current wrapping
    pub fn private_signature_valid(&self) -> Result<(), NymError> {
        if !self.has_private_data() {
            return Err(NymError::NoPrivateMaterial(self.id.to_hex()));
        }
        let signature = self
            .signatures
            .iter()
            .find(|s| s.is_private())
            .ok_or_else(|| self.invalid("missing private signature"))?;
        self.verify(&self.private_signing_bytes()?, signature, KeyRole::Sign)
    }

    /// Re-wrap every private half under `passphrase`
    pub fn re_encrypt_keys(&mut self, passphrase: &Passphrase) -> Result<(), NymError> {
        let id = self.id;
        match self.keys_mut() {
            Some(keys) if keys.has_private() => keys.re_encrypt(passphrase),
            _ => Err(NymError::NoPrivateMaterial(id.to_hex())),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> NymError {
        NymError::ValidationFailed {
            credential_id: self.id.to_hex(),
            reason: reason.into(),
        }
    }

    fn check_common(&self, nym_id: &NymId) -> Result<(), NymError> {
        if self.compute_id()? != self.id {
            return Err(self.invalid("ID does not match content"));
        }
        if self.nym_id != *nym_id {
            return Err(self.invalid(format!("belongs to Nym {}", self.nym_id)));
        }
        Ok(())
    }

    /// Validate a master credential against the Nym's source
    pub fn validate_master(&self, source: &NymIdSource, nym_id: &NymId) -> Result<(), NymError> {
        if self.role() != CredentialRole::MasterKey {
            return Err(self.invalid("not a master credential"));
        }
        self.check_common(nym_id)?;
        if self.master_id != self.id {
            return Err(self.invalid("master ID does not match credential ID"));
        }
        let embedded = source.serialize();
        if self.source() != Some(&embedded) {
            return Err(self.invalid("embedded source differs from the Nym's source"));
        }
        let signing_key = self.keypair(KeyRole::Sign).map(Keypair::public_key);
        if signing_key != Some(embedded.public_key.as_slice()) {
            return Err(self.invalid("signing key is not the source key"));
        }
        if source.nym_id()? != *nym_id {
            return Err(self.invalid("source does not derive the Nym ID"));
        }

        let signature = self
            .signatures
            .iter()
            .find(|s| s.role == SignatureRole::NymIdSource)
            .ok_or_else(|| self.invalid("missing source signature"))?;
        source
            .verify(self, signature)
            .map_err(|_| self.invalid("bad source signature"))
    }

    /// Validate a child credential against its master
    pub fn validate_child(&self, master: &Credential, nym_id: &NymId) -> Result<(), NymError> {
        if self.role() == CredentialRole::MasterKey {
            return Err(self.invalid("unexpected master credential"));
        }
        self.check_common(nym_id)?;
        if self.master_id != master.id {
            return Err(self.invalid(format!("chains to foreign master {}", self.master_id)));
        }

        let signature = self
            .signatures
            .iter()
            .find(|s| s.role == SignatureRole::PublicCredential && s.credential_id == master.id)
            .ok_or_else(|| self.invalid("missing master signature"))?;
        master
            .verify(&self.public_signing_bytes()?, signature, KeyRole::Sign)
            .map_err(|_| self.invalid("bad master signature"))
    }

    #[cfg(test)]
    pub(crate) fn signatures_mut(&mut self) -> &mut Vec<Signature> {
        &mut self.signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nymcred_core::ContactItem;

    fn master() -> (NymIdSource, Credential) {
        let params = NymParameters::default();
        let pass = Passphrase::new("wallet");
        let source = NymIdSource::generate(&params, &pass).unwrap();
        let master = Credential::new_master(&params, &source, &pass).unwrap();
        (source, master)
    }

    #[test]
    fn test_master_is_self_anchored() {
        let (source, master) = master();
        let nym_id = source.nym_id().unwrap();

        assert_eq!(master.role(), CredentialRole::MasterKey);
        assert_eq!(master.master_id(), master.id());
        assert!(master.validate_master(&source, &nym_id).is_ok());
        assert!(master.private_signature_valid().is_ok());
    }

    #[test]
    fn test_master_rejected_by_foreign_source() {
        let (_, master) = master();
        let (other, _) = self::master();
        let other_id = other.nym_id().unwrap();

        assert!(master.validate_master(&other, &other_id).is_err());
    }

    #[test]
    fn test_child_key_signed_by_master() {
        let (source, master) = master();
        let nym_id = source.nym_id().unwrap();
        let child =
            Credential::new_child_key(&NymParameters::default(), &master, &Passphrase::new("wallet"))
                .unwrap();

        assert_eq!(child.master_id(), master.id());
        assert!(child.can_sign());
        assert!(child.validate_child(&master, &nym_id).is_ok());
    }

    #[test]
    fn test_contact_credential_has_no_keys() {
        let (source, master) = master();
        let data = ContactData::new().with_item("identifier", ContactItem::new("name", "Alice"));
        let contact = Credential::new_contact(data.clone(), &master).unwrap();

        assert_eq!(contact.role(), CredentialRole::Contact);
        assert_eq!(contact.contact_data(), Some(&data));
        assert!(!contact.can_sign());
        assert!(!contact.has_private_data());
        assert!(contact
            .validate_child(&master, &source.nym_id().unwrap())
            .is_ok());
    }

    #[test]
    fn test_public_load_drops_private_material() {
        let (_, master) = master();
        let private_form = master.as_serialized(KeyMode::Private, true);
        assert!(private_form.has_private());

        let public_only = Credential::from_serialized(&private_form, None).unwrap();
        assert!(!public_only.has_private_data());
        assert!(public_only.signatures().iter().all(|s| !s.is_private()));
        assert_eq!(public_only.id(), master.id());

        let restored =
            Credential::from_serialized(&private_form, Some(&Passphrase::new("wallet"))).unwrap();
        assert!(restored.can_sign());
        assert!(restored.private_signature_valid().is_ok());
    }

    #[test]
    fn test_tampered_content_changes_id() {
        let (_, master) = master();
        let mut form = master.as_serialized(KeyMode::Public, true);
        form.nym_id = NymId::digest(b"someone else");

        assert!(matches!(
            Credential::from_serialized(&form, None),
            Err(NymError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_re_encrypt_invalidates_private_signature() {
        let (_, mut master) = master();
        master.re_encrypt_keys(&Passphrase::new("export")).unwrap();
        assert!(master.private_signature_valid().is_err());

        master.self_sign().unwrap();
        assert!(master.private_signature_valid().is_ok());
    }

    #[test]
    fn test_master_signs_with_source_key() {
        let (source, master) = master();
        assert_eq!(
            master.keypair(KeyRole::Sign).unwrap().public_key(),
            source.key().public_key()
        );

        let private_form = master.as_serialized(KeyMode::Private, true);
        let restored =
            Credential::from_serialized(&private_form, Some(&Passphrase::new("wallet"))).unwrap();
        let reloaded = NymIdSource::from_master(&restored).unwrap();
        assert!(reloaded.can_sign());
        assert_eq!(reloaded.nym_id().unwrap(), source.nym_id().unwrap());
    }

    #[test]
    fn test_identical_content_gets_distinct_ids() {
        let (_, master) = master();
        let data = ContactData::new().with_item("identifier", ContactItem::new("name", "Alice"));
        let a = Credential::new_contact(data.clone(), &master).unwrap();
        let b = Credential::new_contact(data, &master).unwrap();

        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_release_signatures() {
        let (_, mut master) = master();
        assert_eq!(master.signatures().len(), 2);

        master.release_signatures(true);
        assert_eq!(master.signatures().len(), 1);
        assert_eq!(master.signatures()[0].role, SignatureRole::NymIdSource);

        master.release_signatures(false);
        assert!(master.signatures().is_empty());
    }
}
