//! Content identity
//!
//! A [`ContentHash`] is the SHA-256 digest of a carrier's canonical data URI.
//! Hashing the data URI rather than the file it came from means the same
//! pixel data yields the same identity whether it arrived as a file, a data
//! URI, or a hex data URI. It is the sole deduplication key of the ledgers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a canonical data URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a data URI string
    pub fn of_data_uri(data_uri: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data_uri.as_bytes());
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for log lines and listings
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut digest = [0u8; 32];
        hex::decode_to_slice(s, &mut digest)
            .map_err(|e| format!("invalid content hash '{}': {}", s, e))?;
        Ok(Self(digest))
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        // SHA-256 of "Hello, World!"
        let hash = ContentHash::of_data_uri("Hello, World!");
        assert_eq!(
            hash.to_hex(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(hash.short(), "dffd6021bb2b");
    }

    #[test]
    fn test_hash_consistency() {
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(ContentHash::of_data_uri(uri), ContentHash::of_data_uri(uri));
    }

    #[test]
    fn test_different_uri_different_hash() {
        let a = ContentHash::of_data_uri("data:image/png;base64,AAAA");
        let b = ContentHash::of_data_uri("data:image/png;base64,AAAB");
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_and_display() {
        let hash = ContentHash::of_data_uri("data:image/png;base64,AAAA");
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("too_short".parse::<ContentHash>().is_err());
        assert!("zz".repeat(32).parse::<ContentHash>().is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let hash = ContentHash::of_data_uri("x");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert!(serde_json::from_str::<ContentHash>("\"abc\"").is_err());
    }
}
