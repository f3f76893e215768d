//! Digest engine. Evaluates the hash functions an evidence record may use, and resolves the
//! algorithm identifiers found in ASN.1 (OIDs) and XML (URIs) records.
use crate::common::DigestValue;
use crate::errors::Error;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use std::fmt;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Digest algorithms supported for hash trees, message imprints and covered objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum DigestAlgorithm {
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
    /// BLAKE2b with a 256 bit output
    Blake2b256,
    /// BLAKE2b with a 512 bit output
    Blake2b512,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in declaration order.
    pub const ALL: [DigestAlgorithm; 10] = [
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Sha3_224,
        DigestAlgorithm::Sha3_256,
        DigestAlgorithm::Sha3_384,
        DigestAlgorithm::Sha3_512,
        DigestAlgorithm::Blake2b256,
        DigestAlgorithm::Blake2b512,
    ];

    /// Output size in bytes.
    pub fn output_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha224 | DigestAlgorithm::Sha3_224 => 28,
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha3_256 | DigestAlgorithm::Blake2b256 => {
                32
            }
            DigestAlgorithm::Sha384 | DigestAlgorithm::Sha3_384 => 48,
            DigestAlgorithm::Sha512 | DigestAlgorithm::Sha3_512 | DigestAlgorithm::Blake2b512 => {
                64
            }
        }
    }

    /// Dotted object identifier, as used in RFC 4998 records.
    pub fn oid(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "2.16.840.1.101.3.4.2.4",
            DigestAlgorithm::Sha256 => "2.16.840.1.101.3.4.2.1",
            DigestAlgorithm::Sha384 => "2.16.840.1.101.3.4.2.2",
            DigestAlgorithm::Sha512 => "2.16.840.1.101.3.4.2.3",
            DigestAlgorithm::Sha3_224 => "2.16.840.1.101.3.4.2.7",
            DigestAlgorithm::Sha3_256 => "2.16.840.1.101.3.4.2.8",
            DigestAlgorithm::Sha3_384 => "2.16.840.1.101.3.4.2.9",
            DigestAlgorithm::Sha3_512 => "2.16.840.1.101.3.4.2.10",
            DigestAlgorithm::Blake2b256 => "1.3.6.1.4.1.1722.12.2.1.8",
            DigestAlgorithm::Blake2b512 => "1.3.6.1.4.1.1722.12.2.1.16",
        }
    }

    /// XML Signature / Encryption URI, as used in RFC 6283 records. BLAKE2b has none.
    pub fn uri(self) -> Option<&'static str> {
        match self {
            DigestAlgorithm::Sha224 => Some("http://www.w3.org/2001/04/xmldsig-more#sha224"),
            DigestAlgorithm::Sha256 => Some("http://www.w3.org/2001/04/xmlenc#sha256"),
            DigestAlgorithm::Sha384 => Some("http://www.w3.org/2001/04/xmldsig-more#sha384"),
            DigestAlgorithm::Sha512 => Some("http://www.w3.org/2001/04/xmlenc#sha512"),
            DigestAlgorithm::Sha3_224 => Some("http://www.w3.org/2007/05/xmldsig-more#sha3-224"),
            DigestAlgorithm::Sha3_256 => Some("http://www.w3.org/2007/05/xmldsig-more#sha3-256"),
            DigestAlgorithm::Sha3_384 => Some("http://www.w3.org/2007/05/xmldsig-more#sha3-384"),
            DigestAlgorithm::Sha3_512 => Some("http://www.w3.org/2007/05/xmldsig-more#sha3-512"),
            DigestAlgorithm::Blake2b256 | DigestAlgorithm::Blake2b512 => None,
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "SHA224",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
            DigestAlgorithm::Sha3_224 => "SHA3-224",
            DigestAlgorithm::Sha3_256 => "SHA3-256",
            DigestAlgorithm::Sha3_384 => "SHA3-384",
            DigestAlgorithm::Sha3_512 => "SHA3-512",
            DigestAlgorithm::Blake2b256 => "BLAKE2B-256",
            DigestAlgorithm::Blake2b512 => "BLAKE2B-512",
        }
    }

    /// Resolve an algorithm identifier: a dotted OID, an XML URI or a name such as `SHA-256`.
    ///
    /// # Errors
    /// The function fails with `Error::UnsupportedAlgorithm` if the identifier is unknown.
    pub fn from_identifier(identifier: &str) -> Result<Self, Error> {
        let trimmed = identifier.trim();
        let normalized = trimmed.to_ascii_uppercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|alg| {
                alg.oid() == trimmed
                    || alg.uri() == Some(trimmed)
                    || alg.name() == normalized
                    || alg.name().replacen('-', "", 1) == normalized.replacen('-', "", 1)
            })
            .ok_or_else(|| Error::UnsupportedAlgorithm(identifier.to_owned()))
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn hash_with<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut h = D::new();
    for part in parts {
        h.update(part);
    }
    h.finalize().to_vec()
}

/// Hash the concatenation of `parts` with `algorithm`, without materialising the concatenation.
pub fn digest_parts(algorithm: DigestAlgorithm, parts: &[&[u8]]) -> DigestValue {
    let out = match algorithm {
        DigestAlgorithm::Sha224 => hash_with::<Sha224>(parts),
        DigestAlgorithm::Sha256 => hash_with::<Sha256>(parts),
        DigestAlgorithm::Sha384 => hash_with::<Sha384>(parts),
        DigestAlgorithm::Sha512 => hash_with::<Sha512>(parts),
        DigestAlgorithm::Sha3_224 => hash_with::<Sha3_224>(parts),
        DigestAlgorithm::Sha3_256 => hash_with::<Sha3_256>(parts),
        DigestAlgorithm::Sha3_384 => hash_with::<Sha3_384>(parts),
        DigestAlgorithm::Sha3_512 => hash_with::<Sha3_512>(parts),
        DigestAlgorithm::Blake2b256 => hash_with::<Blake2b<U32>>(parts),
        DigestAlgorithm::Blake2b512 => hash_with::<Blake2b512>(parts),
    };
    DigestValue(out)
}

/// Hash `bytes` with `algorithm`.
pub fn digest(algorithm: DigestAlgorithm, bytes: &[u8]) -> DigestValue {
    digest_parts(algorithm, &[bytes])
}

/// Hash `bytes` with the algorithm named by `identifier`.
///
/// # Errors
/// Fails with `Error::UnsupportedAlgorithm` when the identifier is unknown.
pub fn digest_by_identifier(identifier: &str, bytes: &[u8]) -> Result<DigestValue, Error> {
    Ok(digest(DigestAlgorithm::from_identifier(identifier)?, bytes))
}
