//! Integration tests for persisting and reloading credential sets

use nymcred_core::{
    ContactData, ContactItem, CredentialSetMode, KeyRole, SerializedCredentialSet, SignatureRole,
};
use nymcred_store::{CredentialStore, FsCredentialStore, InMemoryCredentialStore};
use nymcred_wallet::{CredentialSet, CredentialSetConfig, NymError, Passphrase};

mod common;
use common::{fresh_set, wallet_passphrase};

#[test]
fn test_index_mode_reload_from_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsCredentialStore::new(dir.path()).unwrap();

    let mut set = fresh_set();
    set.add_contact_credential(
        ContactData::new().with_item("identifier", ContactItem::new("name", "Carol").primary()),
    )
    .unwrap();
    set.write_credentials(&store).unwrap();

    let index = set.serialize(CredentialSetMode::Index).unwrap();
    let json = index.to_json().unwrap();

    let reloaded = CredentialSet::from_serialized(
        &SerializedCredentialSet::from_json(&json).unwrap(),
        &store,
        Some(&wallet_passphrase()),
        CredentialSetConfig::default(),
    )
    .unwrap();

    assert_eq!(reloaded.nym_id(), set.nym_id());
    assert_eq!(reloaded.child_credential_count(), 2);
    assert!(reloaded.verify_internally().is_ok());

    // The reloaded set signs with the same child key as the original
    let signature = reloaded.sign(b"ping", SignatureRole::PeerRequest, KeyRole::Sign).unwrap();
    assert!(set.verify(b"ping", &signature, KeyRole::Sign).is_ok());
}

#[test]
fn test_public_reload_can_verify_but_not_sign() {
    let set = fresh_set();
    let signature = set.sign(b"claim", SignatureRole::Claim, KeyRole::Sign).unwrap();

    let full = set.serialize(CredentialSetMode::Full).unwrap();
    let public = CredentialSet::from_full(&full, None, CredentialSetConfig::default()).unwrap();

    assert!(!public.has_private());
    assert!(public.verify(b"claim", &signature, KeyRole::Sign).is_ok());
    assert!(matches!(
        public.sign(b"claim", SignatureRole::Claim, KeyRole::Sign),
        Err(NymError::NoSigningCredential)
    ));
}

#[test]
fn test_export_then_import_under_new_passphrase() {
    let mut set = fresh_set();
    let master_id = set.master_credential_id().unwrap();
    let child_id = set.child_credential_id_by_index(0).unwrap();

    // Export: wrap under a one-time passphrase and hand over armored text
    let export_pass = Passphrase::new("one-time export");
    let scratch = InMemoryCredentialStore::new();
    set.re_encrypt_private_credentials(
        &export_pass,
        nymcred_wallet::ReEncryptMode::Export,
        &scratch,
    )
    .unwrap();
    let master_text = set.master_as_string(true).unwrap();
    let child_text = set
        .child_credential(&child_id, None)
        .unwrap()
        .as_string(true)
        .unwrap();

    // The wallet passphrase no longer opens the exported keys
    assert!(CredentialSet::load_master_from_string(
        &master_text,
        set.nym_id(),
        &master_id,
        Some(&wallet_passphrase()),
        CredentialSetConfig::default(),
    )
    .is_err());

    // Import: open with the export passphrase, then re-root under our own
    let mut imported = CredentialSet::load_master_from_string(
        &master_text,
        set.nym_id(),
        &master_id,
        Some(&export_pass),
        CredentialSetConfig::default(),
    )
    .unwrap();
    imported
        .load_child_credential_from_string(&child_text, &child_id, Some(&export_pass))
        .unwrap();

    let store = InMemoryCredentialStore::new();
    let importer_pass = Passphrase::new("importer");
    let outcome = imported
        .re_encrypt_private_credentials(
            &importer_pass,
            nymcred_wallet::ReEncryptMode::Import,
            &store,
        )
        .unwrap();
    assert_eq!(outcome.persisted, vec![master_id, child_id]);
    assert!(store.contains(&master_id));

    assert!(imported.master().unwrap().private_signature_valid().is_ok());
    assert!(imported.verify_internally().is_ok());

    // The persisted copies open under the importer's passphrase only
    let reloaded = CredentialSet::load_master(
        &store,
        set.nym_id(),
        &master_id,
        Some(&importer_pass),
        CredentialSetConfig::default(),
    )
    .unwrap();
    assert!(reloaded.master().unwrap().can_sign());
    assert!(reloaded.source().can_sign());
}
