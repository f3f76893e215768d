//! Structures common to all parts of the evidence record engine
use std::fmt;

#[cfg(feature = "serde_enabled")]
use {
    serde::{Deserialize, Serialize},
    serde_with::{hex::Hex, serde_as},
};

/// Largest digest produced by any supported algorithm (SHA-512, SHA3-512, BLAKE2b-512).
pub const MAX_DIGEST_SIZE: usize = 64;

/// A digest value, which is represented as an array of bytes. Its length is determined by the
/// algorithm that produced it.
#[cfg_attr(feature = "serde_enabled", serde_as)]
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct DigestValue(
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Hex"))] pub(crate) Vec<u8>,
);

impl DigestValue {
    /// Return `Self` as its byte representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Tries to convert a slice of `bytes` as `Self`.
    ///
    /// # Errors
    /// This function returns an error if `bytes` is empty or longer than `MAX_DIGEST_SIZE`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::errors::Error> {
        if bytes.is_empty() || bytes.len() > MAX_DIGEST_SIZE {
            return Err(crate::errors::Error::InvalidDigestSize(bytes.len()));
        }
        Ok(DigestValue(bytes.to_vec()))
    }

    /// Parse a hexadecimal digest, as found in XML evidence records and test vectors.
    /// # Errors
    /// `Error::InvalidHex` if `s` is not hexadecimal, otherwise as `from_bytes`.
    pub fn from_hex(s: &str) -> Result<Self, crate::errors::Error> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Lowercase hexadecimal form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Byte length of the digest.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed digest.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for DigestValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DigestValue({})", self.to_hex())
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Stable identifier of a covered object, e.g. a certificate token id or a document name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct ObjectKey(pub String);

impl ObjectKey {
    /// Create a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        ObjectKey(key.into())
    }

    /// Return the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectKey {
    fn from(s: &str) -> Self {
        ObjectKey(s.to_owned())
    }
}

impl From<String> for ObjectKey {
    fn from(s: String) -> Self {
        ObjectKey(s)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
