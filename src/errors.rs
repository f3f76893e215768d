//! Errors specific to evidence record verification
use ed25519_dalek as ed25519;

/// Message reported when the digest attested by an evidence record without hash tree does not
/// match the object it is being applied to.
pub const INCORPORATION_MISMATCH_MESSAGE: &str =
    "The digest covered by the evidence record do not correspond to the digest computed on the signature!";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Enum of errors associated with evidence record verification
pub enum Error {
    /// This error occurs when a node group of a hash tree is structurally inconsistent (empty
    /// group, tree without groups, or a tree-less time-stamp with several leaves).
    #[error("malformed hash tree: {0}")]
    MalformedHashTree(String),
    /// This error occurs when the first archive time-stamp of a record without hash tree does
    /// not attest the digest of the object the record is applied to.
    #[error("{}", INCORPORATION_MISMATCH_MESSAGE)]
    IncorporationMismatch,
    /// Error occurs when a digest or signature algorithm identifier is not recognised.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// Error occurs when the archive time-stamp sequence cannot be walked at all.
    #[error("malformed evidence record: {0}")]
    MalformedEvidenceRecord(String),
    /// Error occurs when no parser accepts the supplied bytes.
    #[error("unsupported evidence record format: {0}")]
    UnsupportedFormat(String),
    /// Error occurs when the size of a digest is not the one its algorithm produces.
    #[error("invalid digest size: {0}")]
    InvalidDigestSize(usize),
    /// Error occurs when a hexadecimal digest cannot be decoded.
    #[error("invalid hexadecimal digest: {0}")]
    InvalidHex(String),
    /// Error occurs when the size of a time-stamping key is not the expected.
    #[error("invalid key size: {0}")]
    InvalidKeySize(usize),
    /// This error occurs when a time-stamp token signature (ed25519) cannot be decoded.
    #[error("ed25519 signature error: {0}")]
    Ed25519Signature(String),
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Error {
        Error::InvalidHex(err.to_string())
    }
}

impl From<ed25519::SignatureError> for Error {
    fn from(sig: ed25519::SignatureError) -> Error {
        Error::Ed25519Signature(format!("{:?}", sig))
    }
}
