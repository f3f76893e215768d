//! Verdict structures returned by the validator, and the simple-report indications derived from
//! them. Everything here is produced fresh by one validation run and never mutated afterwards.
use crate::common::{DigestValue, ObjectKey};
use crate::digest::DigestAlgorithm;
use crate::model::{CoveredCategory, IncorporationType};
use chrono::{DateTime, Utc};

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// What a `DigestMatcher` checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum DigestMatcherType {
    /// The recomputed root against the token's message imprint.
    MessageImprint,
    /// The predecessor time-stamp token inside the leaf group.
    EvidenceRecordArchiveTimeStamp,
    /// The signature an internal evidence record is embedded in.
    EvidenceRecordMasterSignature,
    /// A signature protected by an external evidence record.
    EvidenceRecordSignature,
    /// Signed data (detached document).
    EvidenceRecordSignedData,
    /// A certificate.
    EvidenceRecordCertificate,
    /// A CRL or OCSP response.
    EvidenceRecordRevocation,
    /// A time-stamp token of the signature.
    EvidenceRecordTimestamp,
    /// A prior evidence record.
    EvidenceRecordPriorEvidenceRecord,
}

impl DigestMatcherType {
    /// Matcher type used for objects of `category`.
    pub fn for_category(category: CoveredCategory, incorporation: IncorporationType) -> Self {
        match (category, incorporation) {
            (CoveredCategory::Signature, IncorporationType::Internal) => {
                DigestMatcherType::EvidenceRecordMasterSignature
            }
            (CoveredCategory::Signature, IncorporationType::External) => {
                DigestMatcherType::EvidenceRecordSignature
            }
            (CoveredCategory::SignedData, _) => DigestMatcherType::EvidenceRecordSignedData,
            (CoveredCategory::Certificate, _) => DigestMatcherType::EvidenceRecordCertificate,
            (CoveredCategory::Revocation, _) => DigestMatcherType::EvidenceRecordRevocation,
            (CoveredCategory::Timestamp, _) => DigestMatcherType::EvidenceRecordTimestamp,
            (CoveredCategory::EvidenceRecord, _) => {
                DigestMatcherType::EvidenceRecordPriorEvidenceRecord
            }
        }
    }

    /// Matchers checking a covered object, as opposed to the tree itself.
    pub fn is_covered_object(self) -> bool {
        !matches!(
            self,
            DigestMatcherType::MessageImprint | DigestMatcherType::EvidenceRecordArchiveTimeStamp
        )
    }
}

/// One digest comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct DigestMatcher {
    /// What was compared.
    pub matcher_type: DigestMatcherType,
    /// Key of the covered object, for covered-object matchers.
    pub key: Option<ObjectKey>,
    /// Algorithm of the comparison, when it could be resolved.
    pub digest_algorithm: Option<DigestAlgorithm>,
    /// Digest computed by the engine, when it could be computed.
    pub digest_value: Option<DigestValue>,
    /// The compared data could be located.
    pub data_found: bool,
    /// The compared data matched.
    pub data_intact: bool,
}

impl DigestMatcher {
    /// Matcher for a comparison that could not take place.
    pub(crate) fn not_found(matcher_type: DigestMatcherType, key: Option<ObjectKey>) -> Self {
        Self {
            matcher_type,
            key,
            digest_algorithm: None,
            digest_value: None,
            data_found: false,
            data_intact: false,
        }
    }
}

/// Role of an archive time-stamp in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum TimestampType {
    /// Covers the objects directly.
    ArchiveTimestamp,
    /// Re-time-stamps the predecessor token only.
    TimestampRenewal,
    /// First time-stamp of a new chain, re-hashing everything with a new tree.
    HashTreeRenewal,
}

/// Renewal kind carried by a verdict, `None` for a plain archive time-stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Renewal {
    /// Same chain, predecessor token re-time-stamped.
    TimeStampRenewal,
    /// New chain.
    HashTreeRenewal,
}

impl TimestampType {
    /// The renewal indicator of this type.
    pub fn renewal(self) -> Option<Renewal> {
        match self {
            TimestampType::ArchiveTimestamp => None,
            TimestampType::TimestampRenewal => Some(Renewal::TimeStampRenewal),
            TimestampType::HashTreeRenewal => Some(Renewal::HashTreeRenewal),
        }
    }
}

/// Reason a time-stamp could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum TimestampFailure {
    /// Its hash tree is structurally inconsistent.
    MalformedHashTree(String),
    /// A digest or signature algorithm identifier is unknown.
    UnsupportedAlgorithm(String),
}

/// Position of an archive time-stamp: chain index, then index within the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct TimestampPosition {
    /// Index of the chain in the sequence.
    pub chain: usize,
    /// Index of the time-stamp in its chain.
    pub timestamp: usize,
}

/// Verdict for one archive time-stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct TimestampVerdict {
    /// Where the time-stamp sits.
    pub position: TimestampPosition,
    /// Archive time-stamp, time-stamp renewal or hash-tree renewal.
    pub timestamp_type: TimestampType,
    /// Digest comparisons, the message imprint first.
    pub digest_matchers: Vec<DigestMatcher>,
    /// The recomputed root.
    pub computed_root: Option<DigestValue>,
    /// The message imprint was available.
    pub message_imprint_found: bool,
    /// The recomputed root equals the message imprint.
    pub message_imprint_intact: bool,
    /// Token signature verifies.
    pub signature_intact: bool,
    /// Token signature verifies and comes from a trusted source.
    pub signature_valid: bool,
    /// Trusted generation time, as given by the TSA verifier.
    pub trusted_time: Option<DateTime<Utc>>,
    /// Every earlier time-stamp is intact, and so is every link up to this one.
    pub inherits_trust: bool,
    /// Set when the time-stamp could not be evaluated.
    pub failure: Option<TimestampFailure>,
}

impl TimestampVerdict {
    /// Renewal indicator.
    pub fn renewal(&self) -> Option<Renewal> {
        self.timestamp_type.renewal()
    }

    /// All digest comparisons succeeded and the time-stamp was evaluated.
    pub fn is_intact(&self) -> bool {
        self.failure.is_none()
            && self.message_imprint_intact
            && self.digest_matchers.iter().all(|m| m.data_intact)
    }

    /// Matchers of a given type.
    pub fn matchers_of(
        &self,
        matcher_type: DigestMatcherType,
    ) -> impl Iterator<Item = &DigestMatcher> {
        self.digest_matchers
            .iter()
            .filter(move |m| m.matcher_type == matcher_type)
    }

    /// The chaining matcher, for renewals and chained archive time-stamps.
    pub fn chaining_matcher(&self) -> Option<&DigestMatcher> {
        self.matchers_of(DigestMatcherType::EvidenceRecordArchiveTimeStamp)
            .next()
    }

    /// Simple-report indication of this time-stamp.
    pub fn indication(&self) -> (Indication, Option<SubIndication>) {
        match &self.failure {
            Some(TimestampFailure::MalformedHashTree(_)) => {
                return (Indication::Failed, Some(SubIndication::FormatFailure))
            }
            Some(TimestampFailure::UnsupportedAlgorithm(_)) => {
                return (
                    Indication::Indeterminate,
                    Some(SubIndication::CryptoConstraintsFailure),
                )
            }
            None => {}
        }
        let hash_failure = !self.message_imprint_intact
            || self
                .digest_matchers
                .iter()
                .any(|m| !m.matcher_type.is_covered_object() && !m.data_intact);
        if hash_failure {
            (Indication::Failed, Some(SubIndication::HashFailure))
        } else if !self.signature_intact {
            (Indication::Failed, Some(SubIndication::SigCryptoFailure))
        } else if !self.signature_valid {
            (
                Indication::Indeterminate,
                Some(SubIndication::CertificateChainGeneralFailure),
            )
        } else {
            (Indication::Passed, None)
        }
    }
}

/// Transition between two consecutive archive time-stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct ChainLink {
    /// The predecessor.
    pub from: TimestampPosition,
    /// The successor, which must contain the predecessor token digest.
    pub to: TimestampPosition,
    /// How the successor renews the predecessor.
    pub timestamp_type: TimestampType,
    /// The predecessor token digest is part of the successor's tree.
    pub intact: bool,
}

/// Number of covered objects per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct CoveredCounts {
    /// Signatures.
    pub signatures: usize,
    /// Signed data.
    pub signed_data: usize,
    /// Certificates.
    pub certificates: usize,
    /// Revocation data.
    pub revocations: usize,
    /// Time-stamps.
    pub timestamps: usize,
    /// Prior evidence records.
    pub evidence_records: usize,
}

impl CoveredCounts {
    pub(crate) fn add(&mut self, category: CoveredCategory) {
        match category {
            CoveredCategory::Signature => self.signatures += 1,
            CoveredCategory::SignedData => self.signed_data += 1,
            CoveredCategory::Certificate => self.certificates += 1,
            CoveredCategory::Revocation => self.revocations += 1,
            CoveredCategory::Timestamp => self.timestamps += 1,
            CoveredCategory::EvidenceRecord => self.evidence_records += 1,
        }
    }
}

/// Consolidated verdict of one evidence record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct EvidenceRecordVerdict {
    /// Internal or external record.
    pub incorporation: IncorporationType,
    /// Covered-object matchers of the first archive time-stamp.
    pub digest_matchers: Vec<DigestMatcher>,
    /// One verdict per archive time-stamp, in sequence order.
    pub timestamps: Vec<TimestampVerdict>,
    /// One link per consecutive pair of time-stamps.
    pub links: Vec<ChainLink>,
    /// Covered objects found, per category.
    pub covered_counts: CoveredCounts,
    /// Every time-stamp is intact.
    pub overall_intact: bool,
    /// Every token signature is valid.
    pub all_tokens_valid: bool,
    /// Earliest proof of existence of the covered objects consistent with the whole sequence.
    pub proof_of_existence: Option<DateTime<Utc>>,
}

impl EvidenceRecordVerdict {
    /// Verdict of the time-stamp at `chain`, `timestamp`.
    pub fn timestamp(&self, chain: usize, timestamp: usize) -> Option<&TimestampVerdict> {
        self.timestamps
            .iter()
            .find(|t| t.position == TimestampPosition { chain, timestamp })
    }

    /// Simple-report indication of the whole record.
    ///
    /// A covered object missing from the first tree, or any time-stamp with a hash failure,
    /// fails the record with `HashFailure`. Otherwise the worst time-stamp indication is
    /// reported, the earliest one on ties.
    pub fn indication(&self) -> (Indication, Option<SubIndication>) {
        let hash_failure = (Indication::Failed, Some(SubIndication::HashFailure));
        if self.digest_matchers.iter().any(|m| !m.data_intact) {
            return hash_failure;
        }
        let indications: Vec<_> = self
            .timestamps
            .iter()
            .map(TimestampVerdict::indication)
            .collect();
        if indications.contains(&hash_failure) {
            return hash_failure;
        }
        indications
            .into_iter()
            .fold((Indication::Passed, None), |worst, current| {
                if current.0.severity() > worst.0.severity() {
                    current
                } else {
                    worst
                }
            })
    }
}

/// Main indication of a simple report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Indication {
    /// All checks succeeded.
    Passed,
    /// A check failed definitively.
    Failed,
    /// The outcome depends on information that is missing.
    Indeterminate,
}

impl Indication {
    fn severity(self) -> u8 {
        match self {
            Indication::Passed => 0,
            Indication::Indeterminate => 1,
            Indication::Failed => 2,
        }
    }
}

/// Sub-indication refining `Failed` and `Indeterminate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum SubIndication {
    /// A recomputed digest does not match.
    HashFailure,
    /// The structure could not be evaluated.
    FormatFailure,
    /// The token signature does not verify.
    SigCryptoFailure,
    /// An algorithm is not supported.
    CryptoConstraintsFailure,
    /// The token signer is not trusted.
    CertificateChainGeneralFailure,
}
