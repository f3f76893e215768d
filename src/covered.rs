//! Covered-object digest resolution. The signature-format layer supplies the objects an
//! evidence record protects; this module computes their canonical digests on demand.
use crate::common::{DigestValue, ObjectKey};
use crate::digest::{digest, DigestAlgorithm};
use crate::model::{CoveredCategory, CoveredReference, IncorporationType};
use crate::verdict::DigestMatcherType;
use std::collections::BTreeMap;

/// Content of a covered object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoveredData<'a> {
    /// Complete encoding, hashed as is (signature, DER certificate, CRL/OCSP, record, document).
    Bytes(&'a [u8]),
    /// A document only known by its digest for one algorithm.
    Digest {
        /// Algorithm of `value`.
        algorithm: DigestAlgorithm,
        /// The digest.
        value: DigestValue,
    },
}

impl CoveredData<'_> {
    /// Digest of the content with `algorithm`, `None` for a digest-only document of another
    /// algorithm.
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Option<DigestValue> {
        match self {
            CoveredData::Bytes(bytes) => Some(digest(algorithm, bytes)),
            CoveredData::Digest {
                algorithm: known,
                value,
            } => (*known == algorithm).then(|| value.clone()),
        }
    }
}

/// A covered object expected in the leaf group of an archive time-stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedLeaf {
    /// The record's reference.
    pub reference: CoveredReference,
    /// Matcher type reported for it.
    pub matcher_type: DigestMatcherType,
    /// The object is part of the covered object set.
    pub found: bool,
    /// Its digest, `None` when the object could not be located or hashed.
    pub digest: Option<DigestValue>,
}

/// Objects protected by an evidence record, borrowed for the duration of one validation.
#[derive(Debug, Clone, Default)]
pub struct CoveredObjectSet<'a> {
    objects: BTreeMap<(CoveredCategory, ObjectKey), CoveredData<'a>>,
}

impl<'a> CoveredObjectSet<'a> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, replacing any object of the same category and key.
    pub fn insert(
        &mut self,
        category: CoveredCategory,
        key: impl Into<ObjectKey>,
        data: CoveredData<'a>,
    ) -> &mut Self {
        self.objects.insert((category, key.into()), data);
        self
    }

    /// Builder form of `insert` for raw bytes.
    pub fn with_bytes(
        mut self,
        category: CoveredCategory,
        key: impl Into<ObjectKey>,
        bytes: &'a [u8],
    ) -> Self {
        self.insert(category, key, CoveredData::Bytes(bytes));
        self
    }

    /// Builder form of `insert` for a digest-only document.
    pub fn with_digest(
        mut self,
        key: impl Into<ObjectKey>,
        algorithm: DigestAlgorithm,
        value: DigestValue,
    ) -> Self {
        self.insert(
            CoveredCategory::SignedData,
            key,
            CoveredData::Digest { algorithm, value },
        );
        self
    }

    /// Look up an object.
    pub fn get(&self, category: CoveredCategory, key: &ObjectKey) -> Option<&CoveredData<'a>> {
        self.objects.get(&(category, key.clone()))
    }

    /// Canonical digest of an object, `None` when it cannot be located or computed.
    pub fn resolve(
        &self,
        category: CoveredCategory,
        key: &ObjectKey,
        algorithm: DigestAlgorithm,
    ) -> Option<DigestValue> {
        self.get(category, key)?.digest(algorithm)
    }

    /// Number of objects in the set.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// The set holds no object.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Resolve every reference with `algorithm`, in canonical category order: signature, signed
    /// data, certificates, revocation data, time-stamps, then prior evidence records. Within a
    /// category the reference order is kept.
    pub fn expected_leaves(
        &self,
        references: &[CoveredReference],
        algorithm: DigestAlgorithm,
        incorporation: IncorporationType,
    ) -> Vec<ExpectedLeaf> {
        self.leaves_with(references, incorporation, |data| data.digest(algorithm))
    }

    /// Same order as `expected_leaves`, without digests, for chains whose algorithm is unknown.
    pub fn unresolved_leaves(
        &self,
        references: &[CoveredReference],
        incorporation: IncorporationType,
    ) -> Vec<ExpectedLeaf> {
        self.leaves_with(references, incorporation, |_| None)
    }

    fn leaves_with<F>(
        &self,
        references: &[CoveredReference],
        incorporation: IncorporationType,
        digest_of: F,
    ) -> Vec<ExpectedLeaf>
    where
        F: Fn(&CoveredData<'a>) -> Option<DigestValue>,
    {
        let mut ordered: Vec<&CoveredReference> = references.iter().collect();
        ordered.sort_by_key(|r| r.category);
        ordered
            .into_iter()
            .map(|reference| {
                let data = self.get(reference.category, &reference.key);
                ExpectedLeaf {
                    reference: reference.clone(),
                    matcher_type: DigestMatcherType::for_category(
                        reference.category,
                        incorporation,
                    ),
                    found: data.is_some(),
                    digest: data.and_then(&digest_of),
                }
            })
            .collect()
    }
}
