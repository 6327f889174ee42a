//! Key-generation parameters for new Nyms and credentials

use nymcred_core::{KeyAlgorithm, NymError, SourceType};
use serde::{Deserialize, Serialize};

/// Parameters used when generating sources and key credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NymParameters {
    /// Algorithm for the authentication and signing slots
    pub key_algorithm: KeyAlgorithm,

    /// Algorithm for the encryption slot
    pub encryption_algorithm: KeyAlgorithm,

    /// How the Nym ID is derived
    pub source_type: SourceType,
}

impl Default for NymParameters {
    fn default() -> Self {
        Self {
            key_algorithm: KeyAlgorithm::Dilithium3,
            encryption_algorithm: KeyAlgorithm::X25519,
            source_type: SourceType::PubKey,
        }
    }
}

impl NymParameters {
    pub fn validate(&self) -> Result<(), NymError> {
        if !self.key_algorithm.can_sign() {
            return Err(NymError::Config(format!(
                "{:?} can not be used for signing keys",
                self.key_algorithm
            )));
        }
        if self.encryption_algorithm != KeyAlgorithm::X25519 {
            return Err(NymError::Config(format!(
                "{:?} can not be used for encryption keys",
                self.encryption_algorithm
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(NymParameters::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_signing_key_algorithm() {
        let params = NymParameters {
            key_algorithm: KeyAlgorithm::X25519,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(NymError::Config(_))));
    }
}
