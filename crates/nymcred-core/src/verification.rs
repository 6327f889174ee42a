//! Verification claims carried by verification credentials
//!
//! A verification is one Nym's signed statement about a claim made by
//! another Nym (or by itself). Verification sets group these statements
//! by the Nym they concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::NymId;
use crate::signature::Signature;

/// A single signed verification record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub version: u32,

    /// Hash of the signed record, assigned once signed
    pub id: Option<String>,

    /// Identifier of the claim being verified
    pub claim: String,

    /// Whether the verifier affirms (true) or refutes (false) the claim
    pub valid: bool,

    pub start: DateTime<Utc>,

    pub end: Option<DateTime<Utc>>,

    pub sig: Option<Signature>,
}

impl Verification {
    pub const VERSION: u32 = 1;

    /// An unsigned verification record
    pub fn new(claim: impl Into<String>, valid: bool, start: DateTime<Utc>) -> Self {
        Self {
            version: Self::VERSION,
            id: None,
            claim: claim.into(),
            valid,
            start,
            end: None,
            sig: None,
        }
    }

    /// The canonical form covered by the signature: the record with
    /// its id and signature stripped.
    pub fn signing_form(&self) -> Verification {
        Verification {
            id: None,
            sig: None,
            ..self.clone()
        }
    }

    /// Canonical bytes covered by the signature
    pub fn signing_bytes(&self) -> Result<Vec<u8>, crate::NymError> {
        Ok(serde_json::to_vec(&self.signing_form())?)
    }
}

/// Verifications concerning a single Nym
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationGroup {
    pub nym: NymId,
    pub items: Vec<Verification>,
}

/// The structured payload of a verification credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSet {
    pub version: u32,

    /// Verifications issued by this Nym about others
    pub internal: Vec<VerificationGroup>,

    /// Verifications issued by others about this Nym
    pub external: Vec<VerificationGroup>,
}

impl VerificationSet {
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            internal: Vec::new(),
            external: Vec::new(),
        }
    }

    /// Record a verification this Nym issued about `nym`
    pub fn add_internal(&mut self, nym: NymId, item: Verification) {
        match self.internal.iter_mut().find(|g| g.nym == nym) {
            Some(group) => group.items.push(item),
            None => self.internal.push(VerificationGroup {
                nym,
                items: vec![item],
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.internal
            .iter()
            .chain(self.external.iter())
            .map(|g| g.items.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VerificationSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::CredentialId;
    use crate::role::SignatureRole;

    #[test]
    fn test_signing_form_ignores_signature() {
        let mut item = Verification::new("claim-1", true, Utc::now());
        let unsigned = item.signing_bytes().unwrap();

        item.id = Some("abc".to_string());
        item.sig = Some(Signature::new(
            SignatureRole::Verification,
            CredentialId::digest(b"child"),
            vec![1, 2, 3],
        ));

        assert_eq!(item.signing_bytes().unwrap(), unsigned);
    }

    #[test]
    fn test_add_internal_groups_by_nym() {
        let nym = NymId::digest(b"bob");
        let mut set = VerificationSet::new();
        set.add_internal(nym, Verification::new("c1", true, Utc::now()));
        set.add_internal(nym, Verification::new("c2", false, Utc::now()));

        assert_eq!(set.internal.len(), 1);
        assert_eq!(set.len(), 2);
    }
}
