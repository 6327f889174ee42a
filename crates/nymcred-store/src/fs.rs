//! Filesystem-backed credential store
//!
//! Directory layout:
//! ```text
//! <root>/
//!   <credential id hex>.json   one serialized credential per file
//! ```

use nymcred_core::{CredentialId, SerializedCredential};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::{CredentialStore, StoreError};

/// Persistent credential store rooted at a directory
pub struct FsCredentialStore {
    dir: PathBuf,
}

impl FsCredentialStore {
    /// Create a store rooted at `dir`. The directory is created if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: &CredentialId) -> PathBuf {
        self.dir.join(format!("{}.json", id.to_hex()))
    }
}

impl CredentialStore for FsCredentialStore {
    fn load(&self, id: &CredentialId) -> Result<SerializedCredential, StoreError> {
        let path = self.path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_hex()));
        }

        let bytes = std::fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, credential: &SerializedCredential) -> Result<(), StoreError> {
        let id = credential.id.ok_or(StoreError::MissingId)?;
        let path = self.path(&id);
        let staging = path.with_extension("json.tmp");

        // Private forms carry wrapped key material; the file is owner-only
        // from the moment it exists.
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&staging)?;
        file.write_all(&serde_json::to_vec_pretty(credential)?)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&staging, &path)?;

        tracing::debug!("Wrote credential {} to {}", id, path.display());
        Ok(())
    }

    fn contains(&self, id: &CredentialId) -> bool {
        self.path(id).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_credential;

    #[test]
    fn test_fs_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCredentialStore::new(dir.path().join("creds")).unwrap();
        let credential = sample_credential(b"child");
        let id = credential.id.unwrap();

        assert!(!store.contains(&id));
        store.save(&credential).unwrap();
        assert!(store.contains(&id));
        assert_eq!(store.load(&id).unwrap(), credential);
    }

    #[test]
    fn test_fs_store_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCredentialStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.load(&CredentialId::digest(b"absent")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FsCredentialStore::new(dir.path()).unwrap();
        let credential = sample_credential(b"private");
        store.save(&credential).unwrap();

        let mode = std::fs::metadata(store.path(&credential.id.unwrap()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_store_overwrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FsCredentialStore::new(dir.path()).unwrap();
        let mut credential = sample_credential(b"private");
        store.save(&credential).unwrap();

        credential.version += 1;
        store.save(&credential).unwrap();

        let path = store.path(&credential.id.unwrap());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load(&credential.id.unwrap()).unwrap(), credential);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
