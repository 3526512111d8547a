use arblog_types::ArchiveAddress;
use serde::{Deserialize, Serialize};

/// Ed25519 secret key. Whoever holds it may write to the archive.
pub struct SigningKey(ed25519_dalek::SigningKey);

/// Ed25519 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// Ed25519 signature over a commit record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

impl SigningKey {
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    /// The network address of the archive owned by this key.
    pub fn address(&self) -> ArchiveAddress {
        self.verifying_key().to_address()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self::from_bytes(*self.as_bytes())
    }
}

impl VerifyingKey {
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        use ed25519_dalek::Verifier;
        self.0
            .verify(message, &signature.0)
            .map_err(|_| SignatureError::InvalidSignature)
    }

    pub fn to_address(&self) -> ArchiveAddress {
        ArchiveAddress::from_key(self.0.to_bytes())
    }

    /// Recover the public key from an archive address.
    pub fn from_address(address: &ArchiveAddress) -> Result<Self, SignatureError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(address.as_bytes())
            .map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({})", hex::encode(self.0.to_bytes()))
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0.to_bytes()[..8]))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"commit 1");
        assert!(sk.verifying_key().verify(b"commit 1", &sig).is_ok());
        assert_eq!(
            sk.verifying_key().verify(b"commit 2", &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn address_roundtrips_through_verifying_key() {
        let sk = SigningKey::generate();
        let address = sk.address();
        let vk = VerifyingKey::from_address(&address).unwrap();
        assert_eq!(vk, sk.verifying_key());
    }

    #[test]
    fn distinct_keys_distinct_addresses() {
        assert_ne!(SigningKey::generate().address(), SigningKey::generate().address());
    }

    #[test]
    fn clone_preserves_key() {
        let sk = SigningKey::generate();
        assert_eq!(sk.clone().address(), sk.address());
    }

    #[test]
    fn signature_serde_roundtrip() {
        let sig = SigningKey::generate().sign(b"x");
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn debug_redacts_secret() {
        assert!(format!("{:?}", SigningKey::generate()).contains("redacted"));
    }
}
