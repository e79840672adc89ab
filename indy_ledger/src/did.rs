use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

pub const SEED_LEN: usize = 32;

/// A DID and the full verkey it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidInfo {
    pub did: String,
    pub verkey: String,
}

/// Build a signing key from a 32 character seed, or from OS randomness when no seed is given.
pub fn signing_key_from_seed(seed: Option<&str>) -> Result<SigningKey, WalletError> {
    let Some(seed) = seed else {
        return Ok(SigningKey::generate(&mut OsRng));
    };

    let seed_bytes: [u8; SEED_LEN] = seed.as_bytes().try_into().map_err(|_| {
        WalletError::InvalidSeed(format!(
            "expected {SEED_LEN} bytes, got {}",
            seed.as_bytes().len()
        ))
    })?;
    Ok(SigningKey::from_bytes(&seed_bytes))
}

/// An unqualified DID is the base58 of the first 16 bytes of the verkey.
pub fn did_info_for_key(signing_key: &SigningKey) -> DidInfo {
    let verkey_bytes = signing_key.verifying_key().to_bytes();
    DidInfo {
        did: bs58::encode(&verkey_bytes[..16]).into_string(),
        verkey: bs58::encode(verkey_bytes).into_string(),
    }
}

pub fn decode_verkey(verkey: &str) -> Result<VerifyingKey, WalletError> {
    let bytes = bs58::decode(verkey)
        .into_vec()
        .map_err(|e| WalletError::InvalidKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| WalletError::InvalidKey(format!("verkey has {} bytes", bytes.len())))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| WalletError::InvalidKey(e.to_string()))
}

/// Check a base58 signature over `message` against a base58 verkey.
pub fn verify_signature(verkey: &str, message: &[u8], signature: &str) -> bool {
    let Ok(key) = decode_verkey(verkey) else {
        return false;
    };
    let Ok(sig_bytes) = bs58::decode(signature).into_vec() else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&sig_bytes) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

/// The issuer DID of a legacy ledger identifier (`did:2:...`, `did:3:...`, `did:4:...`).
pub fn author_of_legacy_id(id: &str) -> &str {
    id.split(':').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::Signer;

    use super::*;

    #[test]
    fn test_well_known_steward_seed() {
        let key = signing_key_from_seed(Some("000000000000000000000000Steward1")).unwrap();
        let info = did_info_for_key(&key);

        assert_eq!(info.did, "Th7MpTaRZVRYnPiabds81Y");
        assert_eq!(info.verkey, "FYmoFw55GeQH7SRFa37dkx1d2dZ3zUF8ckg7wmL7ofN4");
    }

    #[test]
    fn test_short_seed_rejected() {
        let result = signing_key_from_seed(Some("too-short"));
        assert!(matches!(result, Err(WalletError::InvalidSeed(_))));
    }

    #[test]
    fn test_signature_round_trip() {
        let key = signing_key_from_seed(None).unwrap();
        let info = did_info_for_key(&key);
        let sig = bs58::encode(key.sign(b"hello").to_bytes()).into_string();

        assert!(verify_signature(&info.verkey, b"hello", &sig));
        assert!(!verify_signature(&info.verkey, b"hellO", &sig));
        assert!(!verify_signature(&info.verkey, b"hello", "not-a-signature"));
    }

    #[test]
    fn test_author_of_legacy_id() {
        assert_eq!(
            author_of_legacy_id("Th7MpTaRZVRYnPiabds81Y:2:Transcript:1.2"),
            "Th7MpTaRZVRYnPiabds81Y"
        );
    }
}
