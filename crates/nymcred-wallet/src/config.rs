//! Credential set policy configuration

/// Policy toggles for a credential set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSetConfig {
    /// Fall back to the master credential's keys when no child key
    /// credential is eligible. Kept for backwards compatibility; masters
    /// should only sign other credentials.
    pub master_key_fallback: bool,

    /// Keep revoked contact and verification credentials in the revoked
    /// map for audit instead of dropping them.
    pub retain_revoked: bool,
}

impl Default for CredentialSetConfig {
    fn default() -> Self {
        Self {
            master_key_fallback: true,
            retain_revoked: true,
        }
    }
}

impl CredentialSetConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            master_key_fallback: std::env::var("NYMCRED_MASTER_KEY_FALLBACK")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.master_key_fallback),
            retain_revoked: std::env::var("NYMCRED_RETAIN_REVOKED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.retain_revoked),
        }
    }

    /// Strict policy: no master fallback
    pub fn strict() -> Self {
        Self {
            master_key_fallback: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Env vars are process-wide, so every from_env case runs in one test.
    #[test]
    fn test_from_env() {
        std::env::remove_var("NYMCRED_MASTER_KEY_FALLBACK");
        std::env::remove_var("NYMCRED_RETAIN_REVOKED");
        assert_eq!(CredentialSetConfig::from_env(), CredentialSetConfig::default());

        std::env::set_var("NYMCRED_MASTER_KEY_FALLBACK", "false");
        std::env::set_var("NYMCRED_RETAIN_REVOKED", "not-a-bool");
        let config = CredentialSetConfig::from_env();
        assert!(!config.master_key_fallback);
        assert!(config.retain_revoked);

        std::env::remove_var("NYMCRED_MASTER_KEY_FALLBACK");
        std::env::remove_var("NYMCRED_RETAIN_REVOKED");
    }
}
