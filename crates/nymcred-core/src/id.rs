//! Content-derived identifiers
//!
//! Both credential IDs and Nym IDs are SHA3-256 digests, rendered as
//! lowercase hex wherever they appear as text or map keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};

macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Hash `data` into an identifier.
            pub fn digest(data: &[u8]) -> Self {
                let mut hasher = Sha3_256::new();
                hasher.update(data);
                Self(hasher.finalize().into())
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, crate::NymError> {
                let bytes = hex::decode(s).map_err(|e| {
                    crate::NymError::InvalidIdentifier(format!("{}: {}", s, e))
                })?;
                let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
                    crate::NymError::InvalidIdentifier(format!("{}: invalid byte length", s))
                })?;
                Ok(Self(bytes))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::NymError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

digest_id!(
    /// Identifier of a single credential (hash of its public form)
    CredentialId
);

digest_id!(
    /// Identifier of a Nym (hash of its identity source)
    NymId
);
