use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// URL scheme used for the textual form of an archive address.
pub const SCHEME: &str = "dat://";

/// Network address of an archive.
///
/// The address is the archive's Ed25519 public key. It stays the same for
/// the archive's whole life, across every committed version; a fork gets a
/// fresh key and therefore a fresh address.
///
/// Textual form is `dat://<64 hex chars>`. Parsing also accepts bare hex and
/// tolerates a trailing `/`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveAddress([u8; 32]);

impl ArchiveAddress {
    /// Create from a raw public key.
    pub fn from_key(key: [u8; 32]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Bare lowercase hex of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Full `dat://` URL.
    pub fn to_url(&self) -> String {
        format!("{SCHEME}{}", self.to_hex())
    }

    /// Short identifier for logs (`dat://` + first 8 hex chars).
    pub fn short_id(&self) -> String {
        format!("{SCHEME}{}", hex::encode(&self.0[..4]))
    }

    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim().trim_end_matches('/');
        let key = match s.split_once("://") {
            Some(("dat", rest)) => rest,
            Some((scheme, _)) => return Err(TypeError::UnsupportedScheme(scheme.to_string())),
            None => s,
        };
        let bytes = hex::decode(key).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl FromStr for ArchiveAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ArchiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchiveAddress({})", self.short_id())
    }
}

impl fmt::Display for ArchiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

// Serialized as the URL string so it reads naturally inside JSON documents.
impl Serialize for ArchiveAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_url())
    }
}

impl<'de> Deserialize<'de> for ArchiveAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> ArchiveAddress {
        ArchiveAddress::from_key([seed; 32])
    }

    #[test]
    fn url_format() {
        let a = addr(0xab);
        let url = a.to_url();
        assert!(url.starts_with("dat://"));
        assert_eq!(url.len(), 6 + 64);
        assert_eq!(format!("{a}"), url);
    }

    #[test]
    fn parse_accepts_url_hex_and_trailing_slash() {
        let a = addr(7);
        assert_eq!(ArchiveAddress::parse(&a.to_url()).unwrap(), a);
        assert_eq!(ArchiveAddress::parse(&a.to_hex()).unwrap(), a);
        assert_eq!(
            ArchiveAddress::parse(&format!("{}/", a.to_url())).unwrap(),
            a
        );
        assert_eq!(a.to_url().parse::<ArchiveAddress>().unwrap(), a);
    }

    #[test]
    fn parse_rejects_other_schemes() {
        let err = ArchiveAddress::parse("https://example.com").unwrap_err();
        assert_eq!(err, TypeError::UnsupportedScheme("https".into()));
    }

    #[test]
    fn parse_rejects_bad_hex() {
        assert!(matches!(
            ArchiveAddress::parse("dat://zz"),
            Err(TypeError::InvalidHex(_))
        ));
        assert!(matches!(
            ArchiveAddress::parse("dat://abcd"),
            Err(TypeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn short_id() {
        assert_eq!(addr(0x11).short_id(), "dat://11111111");
    }

    #[test]
    fn serde_as_url_string() {
        let a = addr(3);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a.to_url()));
        let back: ArchiveAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
