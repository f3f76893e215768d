//! Object model of an evidence record, as produced by the ASN.1 and XML parsers.
//!
//! The structures are built once by a parser and only read afterwards. Algorithm identifiers
//! are kept as they were found in the record (OID or URI), and are resolved lazily so that an
//! unknown identifier only fails the archive time-stamp that uses it.
use crate::common::{DigestValue, ObjectKey};
use chrono::{DateTime, Utc};

#[cfg(feature = "serde_enabled")]
use {
    serde::{Deserialize, Serialize},
    serde_with::{hex::Hex, serde_as},
};

/// Serialization family of an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum EvidenceRecordType {
    /// RFC 4998, DER encoded
    Asn1,
    /// RFC 6283, XML
    Xml,
}

/// How the evidence record is attached to the signature it protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum IncorporationType {
    /// Embedded inside the signature (unsigned attribute / property).
    Internal,
    /// A standalone document referencing the signature.
    External,
}

/// Category of a covered object. The declaration order is the canonical leaf order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum CoveredCategory {
    /// The complete encoding of the protected signature.
    Signature,
    /// Signed data, i.e. a detached document.
    SignedData,
    /// A certificate, DER encoded.
    Certificate,
    /// A CRL or an OCSP response, as transmitted.
    Revocation,
    /// A time-stamp token of the signature (signature or archive time-stamp), as encoded.
    Timestamp,
    /// A prior evidence record, serialized.
    EvidenceRecord,
}

/// Reference from an evidence record to one object it claims to protect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct CoveredReference {
    /// Category of the referenced object.
    pub category: CoveredCategory,
    /// Key under which the object is found in the covered object set.
    pub key: ObjectKey,
}

impl CoveredReference {
    /// Build a reference.
    pub fn new(category: CoveredCategory, key: impl Into<ObjectKey>) -> Self {
        Self {
            category,
            key: key.into(),
        }
    }
}

/// Digest attested by a time-stamp token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct MessageImprint {
    /// Algorithm identifier as found in the token.
    pub algorithm: String,
    /// The attested digest.
    pub digest: DigestValue,
}

/// Signer data of a time-stamp token, consumed by `TsaVerifier` implementations only.
#[cfg_attr(feature = "serde_enabled", serde_as)]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct SignerInfo {
    /// Signature algorithm identifier.
    pub algorithm: String,
    /// Public key of the time-stamping unit.
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Hex"))]
    pub public_key: Vec<u8>,
    /// Bytes covered by the signature (the TSTInfo, or the signed attributes).
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Hex"))]
    pub signed_content: Vec<u8>,
    /// Signature value.
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Hex"))]
    pub signature: Vec<u8>,
}

/// A time-stamp token. Opaque to the verification engine apart from its encoding (hashed by
/// the successor archive time-stamp) and its message imprint.
#[cfg_attr(feature = "serde_enabled", serde_as)]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct TimeStampToken {
    #[cfg_attr(feature = "serde_enabled", serde_as(as = "Hex"))]
    encoded: Vec<u8>,
    message_imprint: MessageImprint,
    gen_time: Option<DateTime<Utc>>,
    signer_info: Option<SignerInfo>,
}

impl TimeStampToken {
    /// Create a token from its complete encoding and its message imprint.
    pub fn new(encoded: Vec<u8>, message_imprint: MessageImprint) -> Self {
        Self {
            encoded,
            message_imprint,
            gen_time: None,
            signer_info: None,
        }
    }

    /// Set the generation time claimed by the token.
    pub fn with_gen_time(mut self, gen_time: DateTime<Utc>) -> Self {
        self.gen_time = Some(gen_time);
        self
    }

    /// Attach the signer data.
    pub fn with_signer_info(mut self, signer_info: SignerInfo) -> Self {
        self.signer_info = Some(signer_info);
        self
    }

    /// Complete encoding of the token.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// The digest attested by the token.
    pub fn message_imprint(&self) -> &MessageImprint {
        &self.message_imprint
    }

    /// Generation time claimed by the token, not yet trusted.
    pub fn gen_time(&self) -> Option<DateTime<Utc>> {
        self.gen_time
    }

    /// Signer data, if the parser extracted it.
    pub fn signer_info(&self) -> Option<&SignerInfo> {
        self.signer_info.as_ref()
    }
}

/// Reduced hash tree of an archive time-stamp. Group 0 holds the leaf digests, every further
/// group holds the siblings needed to climb one level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct HashTree {
    groups: Vec<Vec<DigestValue>>,
}

impl HashTree {
    /// Build a tree from its node groups, leaves first.
    pub fn new(groups: Vec<Vec<DigestValue>>) -> Self {
        Self { groups }
    }

    /// The node groups, leaves first.
    pub fn groups(&self) -> &[Vec<DigestValue>] {
        &self.groups
    }

    /// Digests of group 0, empty for a tree without groups.
    pub fn leaves(&self) -> &[DigestValue] {
        self.groups.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One hash-tree protected, time-stamped proof unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct ArchiveTimeStamp {
    hash_tree: Option<HashTree>,
    token: TimeStampToken,
}

impl ArchiveTimeStamp {
    /// Create an archive time-stamp. A `None` tree means the token directly attests a single
    /// digest.
    pub fn new(hash_tree: Option<HashTree>, token: TimeStampToken) -> Self {
        Self { hash_tree, token }
    }

    /// The reduced hash tree, if any.
    pub fn hash_tree(&self) -> Option<&HashTree> {
        self.hash_tree.as_ref()
    }

    /// The time-stamp token.
    pub fn token(&self) -> &TimeStampToken {
        &self.token
    }
}

/// Ordered archive time-stamps sharing one digest algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct ArchiveTimeStampChain {
    digest_algorithm: String,
    timestamps: Vec<ArchiveTimeStamp>,
}

impl ArchiveTimeStampChain {
    /// Create a chain using the algorithm named by `digest_algorithm` (OID, URI or name).
    pub fn new(digest_algorithm: impl Into<String>, timestamps: Vec<ArchiveTimeStamp>) -> Self {
        Self {
            digest_algorithm: digest_algorithm.into(),
            timestamps,
        }
    }

    /// Algorithm identifier of the chain, as found in the record.
    pub fn digest_algorithm(&self) -> &str {
        &self.digest_algorithm
    }

    /// Archive time-stamps in order.
    pub fn timestamps(&self) -> &[ArchiveTimeStamp] {
        &self.timestamps
    }
}

/// A parsed evidence record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct EvidenceRecord {
    record_type: EvidenceRecordType,
    incorporation: IncorporationType,
    sequence: Vec<ArchiveTimeStampChain>,
    references: Vec<CoveredReference>,
    filename: Option<String>,
}

impl EvidenceRecord {
    /// Create a record from its archive time-stamp sequence.
    pub fn new(
        record_type: EvidenceRecordType,
        incorporation: IncorporationType,
        sequence: Vec<ArchiveTimeStampChain>,
    ) -> Self {
        Self {
            record_type,
            incorporation,
            sequence,
            references: Vec::new(),
            filename: None,
        }
    }

    /// Declare the objects the record protects.
    pub fn with_references(mut self, references: Vec<CoveredReference>) -> Self {
        self.references = references;
        self
    }

    /// Set the name of the document the record was read from.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// ASN.1 or XML.
    pub fn record_type(&self) -> EvidenceRecordType {
        self.record_type
    }

    /// Internal or external.
    pub fn incorporation(&self) -> IncorporationType {
        self.incorporation
    }

    /// The archive time-stamp sequence, chain 0 first.
    pub fn sequence(&self) -> &[ArchiveTimeStampChain] {
        &self.sequence
    }

    /// Objects the record claims to protect.
    pub fn references(&self) -> &[CoveredReference] {
        &self.references
    }

    /// Name of the source document, if known.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Number of archive time-stamps over all chains.
    pub fn timestamp_count(&self) -> usize {
        self.sequence.iter().map(|c| c.timestamps.len()).sum()
    }
}
