//! Armored text form of a serialized credential

use base64::Engine;
use nymcred_core::{NymError, SerializedCredential};

const BEGIN: &str = "-----BEGIN NYM CREDENTIAL-----";
const END: &str = "-----END NYM CREDENTIAL-----";
const LINE_WIDTH: usize = 64;

/// Armor a credential: base64 of its JSON form between marker lines
pub fn encode(credential: &SerializedCredential) -> Result<String, NymError> {
    let body = base64::engine::general_purpose::STANDARD.encode(credential.to_bytes()?);

    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);
    out.push_str(BEGIN);
    out.push('\n');
    // base64 output is ASCII, so byte offsets are char boundaries
    let mut start = 0;
    while start < body.len() {
        let end = (start + LINE_WIDTH).min(body.len());
        out.push_str(&body[start..end]);
        out.push('\n');
        start = end;
    }
    out.push_str(END);
    out.push('\n');
    Ok(out)
}

/// Parse an armored credential, or a bare JSON one
pub fn decode(input: &str) -> Result<SerializedCredential, NymError> {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        return SerializedCredential::from_bytes(trimmed.as_bytes());
    }

    let inner = trimmed
        .strip_prefix(BEGIN)
        .and_then(|rest| rest.strip_suffix(END))
        .ok_or_else(|| NymError::Serialization("missing credential armor".into()))?;

    let body: String = inner.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| NymError::Serialization(format!("bad credential armor: {}", e)))?;

    SerializedCredential::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Credential, NymIdSource, NymParameters};
    use nymcred_core::KeyMode;
    use nymcred_crypto::Passphrase;

    fn sample() -> SerializedCredential {
        let params = NymParameters::default();
        let pass = Passphrase::new("pw");
        let source = NymIdSource::generate(&params, &pass).unwrap();
        Credential::new_master(&params, &source, &pass)
            .unwrap()
            .as_serialized(KeyMode::Public, true)
    }

    #[test]
    fn test_armor_lines_are_wrapped() {
        let armored = encode(&sample()).unwrap();
        let lines: Vec<&str> = armored.lines().collect();

        assert_eq!(lines.first(), Some(&BEGIN));
        assert_eq!(lines.last(), Some(&END));
        assert!(lines.iter().all(|l| l.len() <= LINE_WIDTH || l.starts_with("-----")));
    }

    #[test]
    fn test_decode_accepts_armor_and_plain_json() {
        let credential = sample();

        let armored = encode(&credential).unwrap();
        assert_eq!(decode(&armored).unwrap(), credential);

        let json = String::from_utf8(credential.to_bytes().unwrap()).unwrap();
        assert_eq!(decode(&json).unwrap(), credential);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not a credential").is_err());
        assert!(decode(&format!("{}\n!!!!\n{}", BEGIN, END)).is_err());
    }
}
