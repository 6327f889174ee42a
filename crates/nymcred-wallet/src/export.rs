//! Credential index export
//!
//! A flat, human-readable listing of a set's credentials with their
//! validity, used when a Nym is written out as markup.

use std::collections::BTreeMap;

use nymcred_core::{CredentialId, CredentialRole, NymError};
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::set::CredentialSet;

/// What `serialize_ids` includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Whether the set itself is the valid one. When false every entry is
    /// marked invalid and only shows up with `show_revoked`.
    pub valid: bool,
    /// Include revoked and filtered entries, marked invalid
    pub show_revoked: bool,
    /// Collect the armored public form of each exported credential
    pub public_info: bool,
    /// Collect the armored private form of each exported credential
    pub private_info: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            valid: true,
            show_revoked: false,
            public_info: false,
            private_info: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportEntryKind {
    MasterCredential,
    KeyCredential,
    Credential,
}

impl ExportEntryKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MasterCredential => "masterCredential",
            Self::KeyCredential => "keyCredential",
            Self::Credential => "credential",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub kind: ExportEntryKind,
    pub id: CredentialId,
    /// Absent for the master itself
    pub master_id: Option<CredentialId>,
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialIndexExport {
    pub entries: Vec<ExportEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub public_info: BTreeMap<CredentialId, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub private_info: BTreeMap<CredentialId, String>,
}

impl CredentialIndexExport {
    /// One markup tag per entry, e.g.
    /// `<keyCredential masterID="..." ID="..." valid="true"/>`
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push('<');
            out.push_str(entry.kind.tag());
            if let Some(master_id) = &entry.master_id {
                out.push_str(&format!(" masterID=\"{}\"", master_id));
            }
            out.push_str(&format!(" ID=\"{}\" valid=\"{}\"/>\n", entry.id, entry.valid));
        }
        out
    }

    fn collect(
        &mut self,
        credential: &Credential,
        options: &ExportOptions,
    ) -> Result<(), NymError> {
        if options.public_info {
            self.public_info
                .insert(credential.id(), credential.as_string(false)?);
        }
        if options.private_info {
            self.private_info
                .insert(credential.id(), credential.as_string(true)?);
        }
        Ok(())
    }
}

impl CredentialSet {
    /// List the master and children, marking each valid unless the set is
    /// exported as invalid or the child appears in `revoked_ids`.
    pub fn serialize_ids(
        &self,
        revoked_ids: &[CredentialId],
        options: ExportOptions,
    ) -> Result<CredentialIndexExport, NymError> {
        let master = self.require_master()?;
        let mut export = CredentialIndexExport::default();

        if options.valid || options.show_revoked {
            export.entries.push(ExportEntry {
                kind: ExportEntryKind::MasterCredential,
                id: master.id(),
                master_id: None,
                valid: options.valid,
            });
            export.collect(master, &options)?;
        }

        let active = self
            .children
            .values()
            .map(|c| (c, options.valid && !revoked_ids.contains(&c.id())));
        let revoked = self.revoked.values().map(|c| (c, false));

        for (credential, valid) in active.chain(revoked) {
            if !valid && !options.show_revoked {
                continue;
            }
            let kind = if credential.role() == CredentialRole::ChildKey {
                ExportEntryKind::KeyCredential
            } else {
                ExportEntryKind::Credential
            };
            export.entries.push(ExportEntry {
                kind,
                id: credential.id(),
                master_id: Some(credential.master_id()),
                valid,
            });
            export.collect(credential, &options)?;
        }

        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CredentialSetConfig, NymParameters};
    use nymcred_core::{ContactData, ContactItem};
    use nymcred_crypto::Passphrase;

    fn set_with_contact() -> (CredentialSet, CredentialId) {
        let mut set = CredentialSet::generate(
            &NymParameters::default(),
            &Passphrase::new("pw"),
            CredentialSetConfig::default(),
        )
        .unwrap();
        let contact = set
            .add_contact_credential(
                ContactData::new().with_item("identifier", ContactItem::new("name", "Bob")),
            )
            .unwrap();
        (set, contact)
    }

    #[test]
    fn test_filtered_children_are_hidden_by_default() {
        let (set, contact) = set_with_contact();

        let export = set.serialize_ids(&[contact], ExportOptions::default()).unwrap();
        assert_eq!(export.entries.len(), 2);
        assert_eq!(export.entries[0].kind, ExportEntryKind::MasterCredential);
        assert_eq!(export.entries[1].kind, ExportEntryKind::KeyCredential);
        assert!(export.entries.iter().all(|e| e.valid));
        assert!(export.public_info.is_empty());
    }

    #[test]
    fn test_show_revoked_marks_entries_invalid() {
        let (mut set, contact) = set_with_contact();
        let options = ExportOptions {
            show_revoked: true,
            ..Default::default()
        };

        let export = set.serialize_ids(&[contact], options).unwrap();
        let entry = export.entries.iter().find(|e| e.id == contact).unwrap();
        assert_eq!(entry.kind, ExportEntryKind::Credential);
        assert!(!entry.valid);

        set.revoke_contact_credentials();
        let export = set.serialize_ids(&[], options).unwrap();
        assert_eq!(export.entries.len(), 3);
        assert!(!export.entries.iter().find(|e| e.id == contact).unwrap().valid);
    }

    #[test]
    fn test_info_maps_and_render() {
        let (set, _) = set_with_contact();
        let options = ExportOptions {
            public_info: true,
            private_info: true,
            ..Default::default()
        };

        let export = set.serialize_ids(&[], options).unwrap();
        assert_eq!(export.public_info.len(), 3);
        assert_eq!(export.private_info.len(), 3);

        let master_id = set.master_credential_id().unwrap();
        let rendered = export.render();
        assert!(rendered.starts_with(&format!(
            "<masterCredential ID=\"{}\" valid=\"true\"/>",
            master_id
        )));
        assert!(rendered.contains(&format!("<keyCredential masterID=\"{}\"", master_id)));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn test_invalid_set_exports_nothing_unless_revoked_shown() {
        let (set, _) = set_with_contact();
        let options = ExportOptions {
            valid: false,
            ..Default::default()
        };
        assert!(set.serialize_ids(&[], options).unwrap().entries.is_empty());
    }
}
