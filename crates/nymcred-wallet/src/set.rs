//! The credential set of a Nym
//!
//! A `CredentialSet` owns the master credential and every child credential
//! of one Nym. Signing, verification, key lookup and revocation are
//! routed through it.

use std::collections::BTreeMap;
use std::sync::Arc;

use nymcred_core::{
    ContactData, CredentialId, CredentialRole, CredentialSetMode, KeyMode, KeyRole, NymError,
    NymId, SerializedCredential, SerializedCredentialSet, Signature, SignatureRole, Verification,
    VerificationSet,
};
use nymcred_crypto::{Keypair, Passphrase, PrivateKey};
use nymcred_store::CredentialStore;

use crate::armor;
use crate::config::CredentialSetConfig;
use crate::credential::Credential;
use crate::params::NymParameters;
use crate::source::NymIdSource;

/// Master credential plus child credentials of a single Nym
#[derive(Debug, Clone)]
pub struct CredentialSet {
    pub(crate) version: u32,
    pub(crate) nym_id: NymId,
    pub(crate) source: Arc<NymIdSource>,
    /// Always set once a public constructor returns
    pub(crate) master: Option<Credential>,
    pub(crate) children: BTreeMap<CredentialId, Credential>,
    pub(crate) revoked: BTreeMap<CredentialId, Credential>,
    pub(crate) config: CredentialSetConfig,
}

impl CredentialSet {
    pub const VERSION: u32 = 1;

    /// Generate a new Nym: source, master and one child key credential
    pub fn generate(
        params: &NymParameters,
        passphrase: &Passphrase,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        let source = NymIdSource::generate(params, passphrase)?;
        Self::generate_with_source(Arc::new(source), params, passphrase, config)
    }

    /// Generate a master and one child key credential for an existing source
    pub fn generate_with_source(
        source: Arc<NymIdSource>,
        params: &NymParameters,
        passphrase: &Passphrase,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        if !source.can_sign() {
            return Err(NymError::NoPrivateMaterial("identity source".into()));
        }

        let master = Credential::new_master(params, &source, passphrase)?;
        let child = Credential::new_child_key(params, &master, passphrase)?;

        let mut set = Self {
            version: Self::VERSION,
            nym_id: source.nym_id()?,
            source,
            master: Some(master),
            children: BTreeMap::new(),
            revoked: BTreeMap::new(),
            config,
        };
        set.children.insert(child.id(), child);
        set.verify_internally()?;

        tracing::info!("Generated credential set for Nym {}", set.nym_id);
        Ok(set)
    }

    /// Rebuild a set from either serialization mode.
    ///
    /// Index mode resolves the master and children through `store`; full
    /// mode ignores it. A master that can not be loaded or validated fails
    /// the whole call, children that fail are skipped with a warning.
    pub fn from_serialized(
        serialized: &SerializedCredentialSet,
        store: &dyn CredentialStore,
        passphrase: Option<&Passphrase>,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        match serialized.mode {
            CredentialSetMode::Index => Self::from_index(serialized, store, passphrase, config),
            CredentialSetMode::Full => Self::from_full(serialized, passphrase, config),
        }
    }

    fn from_index(
        serialized: &SerializedCredentialSet,
        store: &dyn CredentialStore,
        passphrase: Option<&Passphrase>,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        let mut set = Self::load_master(
            store,
            &serialized.nym_id,
            &serialized.master_id,
            passphrase,
            config,
        )?;

        for id in &serialized.active_child_ids {
            if let Err(e) = set.load_child_credential(store, id, passphrase) {
                tracing::warn!("Skipping child credential {} of Nym {}: {}", id, set.nym_id, e);
            }
        }
        for id in &serialized.revoked_child_ids {
            let loaded = store
                .load(id)
                .map_err(NymError::from)
                .and_then(|s| set.load_revoked_from_serialized(&s, passphrase));
            if let Err(e) = loaded {
                tracing::warn!("Skipping revoked credential {} of Nym {}: {}", id, set.nym_id, e);
            }
        }

        Ok(set)
    }

    /// Rebuild a set from a full-mode serialization without a store
    pub fn from_full(
        serialized: &SerializedCredentialSet,
        passphrase: Option<&Passphrase>,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        let master = serialized
            .master_credential
            .as_ref()
            .ok_or(NymError::MissingMaster)?;
        if master.id != Some(serialized.master_id) {
            return Err(NymError::IdMismatch {
                expected: serialized.master_id.to_hex(),
                actual: master.id.map(|id| id.to_hex()).unwrap_or_default(),
            });
        }

        let master = Credential::from_serialized(master, passphrase)?;
        let mut set = Self::from_master(master, &serialized.nym_id, config)?;

        for child in &serialized.active_children {
            if let Err(e) = set.load_child_from_serialized(child, passphrase) {
                tracing::warn!(
                    "Skipping inline child credential {:?} of Nym {}: {}",
                    child.id,
                    set.nym_id,
                    e
                );
            }
        }
        for child in &serialized.revoked_children {
            if let Err(e) = set.load_revoked_from_serialized(child, passphrase) {
                tracing::warn!(
                    "Skipping inline revoked credential {:?} of Nym {}: {}",
                    child.id,
                    set.nym_id,
                    e
                );
            }
        }

        Ok(set)
    }

    /// Build a set holding only its master, loaded from `store`
    pub fn load_master(
        store: &dyn CredentialStore,
        nym_id: &NymId,
        master_id: &CredentialId,
        passphrase: Option<&Passphrase>,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        let serialized = store.load(master_id).map_err(|e| {
            tracing::error!("Failed to load master credential {} for Nym {}: {}", master_id, nym_id, e);
            NymError::from(e)
        })?;
        Self::master_from_serialized(&serialized, nym_id, master_id, passphrase, config)
    }

    /// Build a set holding only its master, parsed from armored or JSON text.
    ///
    /// `passphrase` is used for this call only; importing an exported Nym
    /// passes the export passphrase here.
    pub fn load_master_from_string(
        input: &str,
        nym_id: &NymId,
        master_id: &CredentialId,
        passphrase: Option<&Passphrase>,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        let serialized = armor::decode(input)?;
        Self::master_from_serialized(&serialized, nym_id, master_id, passphrase, config)
    }

    fn master_from_serialized(
        serialized: &SerializedCredential,
        nym_id: &NymId,
        master_id: &CredentialId,
        passphrase: Option<&Passphrase>,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        if serialized.id != Some(*master_id) {
            return Err(NymError::IdMismatch {
                expected: master_id.to_hex(),
                actual: serialized.id.map(|id| id.to_hex()).unwrap_or_default(),
            });
        }
        let master = Credential::from_serialized(serialized, passphrase)?;
        Self::from_master(master, nym_id, config)
    }

    fn from_master(
        master: Credential,
        nym_id: &NymId,
        config: CredentialSetConfig,
    ) -> Result<Self, NymError> {
        if master.role() != CredentialRole::MasterKey {
            return Err(NymError::InvalidCredential(format!(
                "{} is a {} credential, not a master",
                master.id(),
                master.role().as_str()
            )));
        }
        let source = NymIdSource::from_master(&master)?;

        let derived = source.nym_id()?;
        if derived != *nym_id {
            return Err(NymError::NymIdMismatch {
                expected: nym_id.to_hex(),
                actual: derived.to_hex(),
            });
        }

        let set = Self {
            version: Self::VERSION,
            nym_id: derived,
            source: Arc::new(source),
            master: Some(master),
            children: BTreeMap::new(),
            revoked: BTreeMap::new(),
            config,
        };
        set.verify_internally()?;
        Ok(set)
    }

    /// Replace the source recovered from the master with a shared one
    pub fn with_source(mut self, source: Arc<NymIdSource>) -> Result<Self, NymError> {
        let derived = source.nym_id()?;
        if derived != self.nym_id {
            return Err(NymError::NymIdMismatch {
                expected: self.nym_id.to_hex(),
                actual: derived.to_hex(),
            });
        }
        self.source = source;
        Ok(self)
    }

    /// Load, verify and insert one child credential from `store`
    pub fn load_child_credential(
        &mut self,
        store: &dyn CredentialStore,
        id: &CredentialId,
        passphrase: Option<&Passphrase>,
    ) -> Result<CredentialId, NymError> {
        let serialized = store.load(id)?;
        self.check_requested_id(&serialized, id)?;
        self.load_child_from_serialized(&serialized, passphrase)
    }

    /// Load, verify and insert one child credential from armored or JSON text
    pub fn load_child_credential_from_string(
        &mut self,
        input: &str,
        id: &CredentialId,
        passphrase: Option<&Passphrase>,
    ) -> Result<CredentialId, NymError> {
        let serialized = armor::decode(input)?;
        self.check_requested_id(&serialized, id)?;
        self.load_child_from_serialized(&serialized, passphrase)
    }

    /// Verify and insert a child credential. An already loaded credential
    /// with the same ID is replaced; a revoked one is refused.
    pub fn load_child_from_serialized(
        &mut self,
        serialized: &SerializedCredential,
        passphrase: Option<&Passphrase>,
    ) -> Result<CredentialId, NymError> {
        let child = self.verified_child(serialized, passphrase)?;
        let id = child.id();
        if self.revoked.contains_key(&id) {
            return Err(NymError::DuplicateCredential(id.to_hex()));
        }
        if self.children.insert(id, child).is_some() {
            tracing::warn!("Replaced already loaded child credential {}", id);
        }
        Ok(id)
    }

    fn load_revoked_from_serialized(
        &mut self,
        serialized: &SerializedCredential,
        passphrase: Option<&Passphrase>,
    ) -> Result<CredentialId, NymError> {
        let child = self.verified_child(serialized, passphrase)?;
        let id = child.id();
        if self.children.contains_key(&id) {
            return Err(NymError::DuplicateCredential(id.to_hex()));
        }
        self.revoked.insert(id, child);
        Ok(id)
    }

    fn verified_child(
        &self,
        serialized: &SerializedCredential,
        passphrase: Option<&Passphrase>,
    ) -> Result<Credential, NymError> {
        let master = self.require_master()?;
        let child = Credential::from_serialized(serialized, passphrase)?;
        child.validate_child(master, &self.nym_id)?;
        Ok(child)
    }

    fn check_requested_id(
        &self,
        serialized: &SerializedCredential,
        id: &CredentialId,
    ) -> Result<(), NymError> {
        if serialized.id != Some(*id) {
            return Err(NymError::IdMismatch {
                expected: id.to_hex(),
                actual: serialized.id.map(|i| i.to_hex()).unwrap_or_default(),
            });
        }
        Ok(())
    }

    pub fn nym_id(&self) -> &NymId {
        &self.nym_id
    }

    pub fn source(&self) -> &Arc<NymIdSource> {
        &self.source
    }

    pub fn config(&self) -> &CredentialSetConfig {
        &self.config
    }

    pub fn master(&self) -> Option<&Credential> {
        self.master.as_ref()
    }

    pub(crate) fn require_master(&self) -> Result<&Credential, NymError> {
        self.master.as_ref().ok_or(NymError::MissingMaster)
    }

    pub fn master_credential_id(&self) -> Result<CredentialId, NymError> {
        Ok(self.require_master()?.id())
    }

    /// Public form of the master, signatures included
    pub fn serialized_public_master(&self) -> Result<SerializedCredential, NymError> {
        Ok(self.require_master()?.as_serialized(KeyMode::Public, true))
    }

    pub fn master_as_string(&self, private: bool) -> Result<String, NymError> {
        self.require_master()?.as_string(private)
    }

    /// Validate the master against the source, then every child against
    /// the master. One bad child invalidates the whole set.
    pub fn verify_internally(&self) -> Result<(), NymError> {
        let master = self.require_master().map_err(|e| {
            tracing::error!("Nym {} has no master credential", self.nym_id);
            e
        })?;

        if let Err(e) = master.validate_master(&self.source, &self.nym_id) {
            tracing::error!("Master credential {} of Nym {} is invalid: {}", master.id(), self.nym_id, e);
            return Err(e);
        }

        for (key, child) in &self.children {
            if *key != child.id() {
                return Err(NymError::ValidationFailed {
                    credential_id: key.to_hex(),
                    reason: format!("stored under the ID of {}", child.id()),
                });
            }
            if let Err(e) = child.validate_child(master, &self.nym_id) {
                tracing::warn!("Child credential {} of Nym {} is invalid: {}", key, self.nym_id, e);
                return Err(e);
            }
        }

        Ok(())
    }

    fn select_keypair(
        &self,
        role: KeyRole,
        revoked: Option<&[CredentialId]>,
    ) -> Result<&Keypair, NymError> {
        let candidate = self
            .children
            .values()
            .filter(|c| c.role().has_keys())
            .filter(|c| revoked.map_or(true, |ids| !ids.contains(&c.id())))
            .find_map(|c| c.keypair(role));

        if let Some(keypair) = candidate {
            return Ok(keypair);
        }
        if !self.config.master_key_fallback {
            return Err(NymError::NoEligibleKey(role));
        }

        let master = self.require_master()?;
        tracing::debug!(
            "No eligible child key for {:?} on Nym {}, using master {}",
            role,
            self.nym_id,
            master.id()
        );
        master.keypair(role).ok_or(NymError::NoEligibleKey(role))
    }

    /// Authentication key pair of the first eligible child key credential
    pub fn auth_keypair(&self, revoked: Option<&[CredentialId]>) -> Result<&Keypair, NymError> {
        self.select_keypair(KeyRole::Auth, revoked)
    }

    pub fn encryption_keypair(
        &self,
        revoked: Option<&[CredentialId]>,
    ) -> Result<&Keypair, NymError> {
        self.select_keypair(KeyRole::Encrypt, revoked)
    }

    pub fn signing_keypair(&self, revoked: Option<&[CredentialId]>) -> Result<&Keypair, NymError> {
        self.select_keypair(KeyRole::Sign, revoked)
    }

    pub fn public_key(
        &self,
        role: KeyRole,
        revoked: Option<&[CredentialId]>,
    ) -> Result<&[u8], NymError> {
        Ok(self.select_keypair(role, revoked)?.public_key())
    }

    pub fn private_key(
        &self,
        role: KeyRole,
        revoked: Option<&[CredentialId]>,
    ) -> Result<&PrivateKey, NymError> {
        self.select_keypair(role, revoked)?
            .private_key()
            .ok_or_else(|| NymError::NoPrivateMaterial(format!("{:?} key", role)))
    }

    /// Key pairs in slot `role` of the credential that made `signature`
    pub fn public_keys_by_signature(&self, signature: &Signature, role: KeyRole) -> Vec<&Keypair> {
        self.children
            .values()
            .filter(|c| c.id() == signature.credential_id)
            .filter_map(|c| c.keypair(role))
            .collect()
    }

    /// Sign `plaintext` in the given role with key slot `key`.
    ///
    /// Public credential signatures come from the master. Source and
    /// private credential signatures are refused. Anything else is signed
    /// by the first child that can sign.
    pub fn sign(
        &self,
        plaintext: &[u8],
        role: SignatureRole,
        key: KeyRole,
    ) -> Result<Signature, NymError> {
        match role {
            SignatureRole::PublicCredential => self.require_master()?.sign(plaintext, role, key),
            SignatureRole::NymIdSource | SignatureRole::PrivateCredential => {
                tracing::warn!("Refusing to sign as {:?} on Nym {}", role, self.nym_id);
                Err(NymError::UnsupportedSignatureRole(role))
            }
            _ => self.first_signer()?.sign(plaintext, role, key),
        }
    }

    fn first_signer(&self) -> Result<&Credential, NymError> {
        self.children
            .values()
            .find(|c| c.can_sign())
            .ok_or(NymError::NoSigningCredential)
    }

    /// Encryption key pair of the first child that can sign, private half
    /// included. Peers encrypt transport traffic to its public half.
    pub fn transport_keypair(&self) -> Result<&Keypair, NymError> {
        let signer = self.first_signer()?;
        signer
            .keypair(KeyRole::Encrypt)
            .filter(|kp| kp.has_private())
            .ok_or_else(|| NymError::NoPrivateMaterial(signer.id().to_hex()))
    }

    /// Have the identity source sign a master credential's public form
    pub fn sign_with_source(
        &self,
        params: &NymParameters,
        master: &Credential,
    ) -> Result<Signature, NymError> {
        self.source.sign(params, master)
    }

    /// Verify content signed with key slot `key` of one of this set's
    /// children
    pub fn verify(
        &self,
        plaintext: &[u8],
        signature: &Signature,
        key: KeyRole,
    ) -> Result<(), NymError> {
        let master = self.require_master()?;
        if signature.credential_id == master.id() {
            return Err(NymError::MasterSignsContent);
        }

        let signer = self
            .children
            .get(&signature.credential_id)
            .ok_or_else(|| NymError::UnknownSigner(signature.credential_id.to_hex()))?;
        signer.verify(plaintext, signature, key)
    }

    /// Sign a verification claim and give it a content-derived ID
    pub fn sign_verification(&self, item: Verification) -> Result<Verification, NymError> {
        let mut signed = item.signing_form();
        let signature = self.sign(
            &signed.signing_bytes()?,
            SignatureRole::Verification,
            KeyRole::Sign,
        )?;
        signed.sig = Some(signature);
        signed.id = Some(CredentialId::digest(&serde_json::to_vec(&signed)?).to_hex());
        Ok(signed)
    }

    /// Verify a verification claim over its canonical signing form
    pub fn verify_verification(&self, item: &Verification) -> Result<(), NymError> {
        let signature = item.sig.as_ref().ok_or(NymError::InvalidSignature)?;
        self.verify(&item.signing_bytes()?, signature, KeyRole::Sign)
    }

    /// Remove every contact credential from the active children
    pub fn revoke_contact_credentials(&mut self) -> Vec<CredentialId> {
        self.revoke_role(CredentialRole::Contact)
    }

    /// Remove every verification credential from the active children
    pub fn revoke_verification_credentials(&mut self) -> Vec<CredentialId> {
        self.revoke_role(CredentialRole::Verification)
    }

    fn revoke_role(&mut self, role: CredentialRole) -> Vec<CredentialId> {
        let ids: Vec<CredentialId> = self
            .children
            .values()
            .filter(|c| c.role() == role)
            .map(Credential::id)
            .collect();

        for id in &ids {
            if let Some(credential) = self.children.remove(id) {
                if self.config.retain_revoked {
                    self.revoked.insert(*id, credential);
                }
            }
        }

        if !ids.is_empty() {
            tracing::info!(
                "Revoked {} {} credential(s) of Nym {}",
                ids.len(),
                role.as_str(),
                self.nym_id
            );
        }
        ids
    }

    /// Attach contact data as a new master-signed credential
    pub fn add_contact_credential(&mut self, data: ContactData) -> Result<CredentialId, NymError> {
        let credential = Credential::new_contact(data, self.require_master()?)?;
        self.insert_child(credential)
    }

    /// Attach verification claims as a new master-signed credential
    pub fn add_verification_credential(
        &mut self,
        set: VerificationSet,
    ) -> Result<CredentialId, NymError> {
        let credential = Credential::new_verification(set, self.require_master()?)?;
        self.insert_child(credential)
    }

    /// Generate an additional child key credential
    pub fn add_child_key_credential(
        &mut self,
        params: &NymParameters,
        passphrase: &Passphrase,
    ) -> Result<CredentialId, NymError> {
        let credential = Credential::new_child_key(params, self.require_master()?, passphrase)?;
        self.insert_child(credential)
    }

    fn insert_child(&mut self, credential: Credential) -> Result<CredentialId, NymError> {
        let id = credential.id();
        if self.children.contains_key(&id) || self.revoked.contains_key(&id) {
            tracing::error!("Credential {} is already part of Nym {}", id, self.nym_id);
            return Err(NymError::DuplicateCredential(id.to_hex()));
        }
        tracing::debug!("Adding {} credential {} to Nym {}", credential.role().as_str(), id, self.nym_id);
        self.children.insert(id, credential);
        Ok(id)
    }

    /// Contact data of the first contact credential
    pub fn contact_data(&self) -> Option<&ContactData> {
        self.children.values().find_map(Credential::contact_data)
    }

    /// Claims of the first verification credential
    pub fn verification_set(&self) -> Option<&VerificationSet> {
        self.children.values().find_map(Credential::verification_set)
    }

    pub fn has_public(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether any child holds private key material
    pub fn has_private(&self) -> bool {
        self.children.values().any(Credential::has_private_data)
    }

    /// Active child by ID, unless it is listed in `revoked`
    pub fn child_credential(
        &self,
        id: &CredentialId,
        revoked: Option<&[CredentialId]>,
    ) -> Option<&Credential> {
        if revoked.is_some_and(|ids| ids.contains(id)) {
            return None;
        }
        self.children.get(id)
    }

    pub fn child_credential_by_index(&self, index: usize) -> Option<&Credential> {
        self.children.values().nth(index)
    }

    pub fn child_credential_id_by_index(&self, index: usize) -> Option<CredentialId> {
        self.children.keys().nth(index).copied()
    }

    pub fn child_credential_count(&self) -> usize {
        self.children.len()
    }

    pub fn revoked_credential(&self, id: &CredentialId) -> Option<&Credential> {
        self.revoked.get(id)
    }

    pub fn revoked_credential_count(&self) -> usize {
        self.revoked.len()
    }

    pub fn clear_child_credentials(&mut self) {
        self.children.clear();
    }

    /// Serialize in index mode (IDs only) or full mode (public forms inline)
    pub fn serialize(&self, mode: CredentialSetMode) -> Result<SerializedCredentialSet, NymError> {
        let master = self.require_master()?;
        let public = |c: &Credential| c.as_serialized(KeyMode::Public, true);

        let mut serialized = SerializedCredentialSet {
            version: self.version,
            nym_id: self.nym_id,
            master_id: master.id(),
            mode,
            active_child_ids: self.children.keys().copied().collect(),
            revoked_child_ids: self.revoked.keys().copied().collect(),
            master_credential: None,
            active_children: Vec::new(),
            revoked_children: Vec::new(),
        };

        if mode == CredentialSetMode::Full {
            serialized.master_credential = Some(public(master));
            serialized.active_children = self.children.values().map(public).collect();
            serialized.revoked_children = self.revoked.values().map(public).collect();
        }

        Ok(serialized)
    }

    /// Persist the master and every active and revoked child
    pub fn write_credentials(&self, store: &dyn CredentialStore) -> Result<(), NymError> {
        let master = self.require_master()?;
        store.save(&master.as_serialized(KeyMode::Private, true))?;

        for credential in self.children.values().chain(self.revoked.values()) {
            store
                .save(&credential.as_serialized(KeyMode::Private, true))
                .map_err(|e| {
                    tracing::error!("Failed to save credential {}: {}", credential.id(), e);
                    NymError::from(e)
                })?;
        }
        Ok(())
    }
}
