//! Re-wrapping private keys for export and import
//!
//! Every key credential is re-wrapped on a clone first. Nothing is saved
//! and the set is left untouched unless every credential re-wraps (and,
//! when importing, re-signs) cleanly. The identity source shares the
//! master's signing key and follows its new wrapping.

use std::sync::Arc;

use nymcred_core::{CredentialId, KeyMode, NymError};
use nymcred_crypto::Passphrase;
use nymcred_store::CredentialStore;

use crate::credential::Credential;
use crate::set::CredentialSet;
use crate::source::NymIdSource;

/// Why private keys are being re-wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReEncryptMode {
    /// Wrap under a one-time passphrase for handing the Nym to someone
    /// else. Self-signatures are left as they are.
    Export,
    /// Re-root trust under the importer's passphrase: re-wrap, then
    /// re-sign the private form of every key credential.
    Import,
}

/// Credentials that were re-encrypted and saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReEncryptOutcome {
    pub mode: ReEncryptMode,
    /// Master first, then key-bearing children in map order
    pub persisted: Vec<CredentialId>,
}

fn stage(
    credential: &Credential,
    passphrase: &Passphrase,
    mode: ReEncryptMode,
) -> Result<Credential, NymError> {
    let mut staged = credential.clone();

    staged
        .re_encrypt_keys(passphrase)
        .map_err(|e| NymError::ReEncryption {
            credential_id: credential.id().to_hex(),
            reason: e.to_string(),
        })?;

    if mode == ReEncryptMode::Import {
        staged.release_signatures(true);
        staged.self_sign().map_err(|e| NymError::ReSigning {
            credential_id: credential.id().to_hex(),
            reason: e.to_string(),
        })?;
    }

    Ok(staged)
}

impl CredentialSet {
    /// Re-wrap every private key under `passphrase`, save the results to
    /// `store`, then commit them to this set.
    pub fn re_encrypt_private_credentials(
        &mut self,
        passphrase: &Passphrase,
        mode: ReEncryptMode,
        store: &dyn CredentialStore,
    ) -> Result<ReEncryptOutcome, NymError> {
        let master = self.require_master()?;
        if !master.has_private_data() {
            tracing::error!("Master credential {} holds no private keys to re-encrypt", master.id());
            return Err(NymError::NoPrivateMaterial(master.id().to_hex()));
        }

        let staged_master = stage(master, passphrase, mode).map_err(|e| {
            tracing::error!("Aborting re-encryption of Nym {}: {}", self.nym_id, e);
            e
        })?;
        let staged_source = NymIdSource::from_master(&staged_master)?;

        let mut staged_children = Vec::new();
        for child in self.children.values().filter(|c| c.has_private_data()) {
            let staged = stage(child, passphrase, mode).map_err(|e| {
                tracing::error!("Aborting re-encryption of Nym {}: {}", self.nym_id, e);
                e
            })?;
            staged_children.push(staged);
        }

        let mut persisted = Vec::with_capacity(staged_children.len() + 1);
        for credential in std::iter::once(&staged_master).chain(staged_children.iter()) {
            if let Err(e) = store.save(&credential.as_serialized(KeyMode::Private, true)) {
                tracing::error!(
                    "Failed to save re-encrypted credential {} ({} already saved): {}",
                    credential.id(),
                    persisted.len(),
                    e
                );
                let saved: Vec<String> = persisted.iter().map(CredentialId::to_hex).collect();
                return Err(NymError::Storage(format!(
                    "saving {} failed after [{}]: {}",
                    credential.id(),
                    saved.join(", "),
                    e
                )));
            }
            persisted.push(credential.id());
        }

        self.master = Some(staged_master);
        self.source = Arc::new(staged_source);
        for child in staged_children {
            self.children.insert(child.id(), child);
        }

        tracing::info!(
            "Re-encrypted {} credential(s) of Nym {} for {:?}",
            persisted.len(),
            self.nym_id,
            mode
        );
        Ok(ReEncryptOutcome { mode, persisted })
    }
}
