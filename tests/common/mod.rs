//! Fixtures shared by the integration tests: an Ed25519 time-stamping unit issuing real
//! signed tokens, and helpers assembling archive time-stamps over known objects.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use ed25519_dalek::{Signer, SigningKey};
use evidence_record_verify::common::DigestValue;
use evidence_record_verify::covered::CoveredObjectSet;
use evidence_record_verify::digest::{digest, DigestAlgorithm};
use evidence_record_verify::hash_tree::recompute_root;
use evidence_record_verify::model::{
    ArchiveTimeStamp, CoveredCategory, CoveredReference, HashTree, MessageImprint, SignerInfo,
    TimeStampToken,
};
use evidence_record_verify::tsa::{Ed25519TsaVerifier, ED25519_OID};

pub const SIGNATURE: &[u8] = b"30820122 signature value of the protected CAdES signature";
pub const CERTIFICATE: &[u8] = b"30820311 signing certificate";
pub const OCSP: &[u8] = b"30820150 ocsp response";

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// A time-stamping unit with a fixed Ed25519 key.
pub struct Tsu {
    key: SigningKey,
}

impl Tsu {
    pub fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    /// Verifier trusting this unit only.
    pub fn verifier(&self) -> Ed25519TsaVerifier {
        Ed25519TsaVerifier::new().trust(&self.key.verifying_key())
    }

    /// A signed token attesting `imprint` at `time`.
    pub fn token(
        &self,
        algorithm: DigestAlgorithm,
        imprint: DigestValue,
        time: DateTime<Utc>,
    ) -> TimeStampToken {
        let mut tst_info = imprint.as_bytes().to_vec();
        tst_info.extend_from_slice(time.to_rfc3339().as_bytes());
        let signature = self.key.sign(&tst_info).to_bytes().to_vec();

        let mut encoded = tst_info.clone();
        encoded.extend_from_slice(&signature);
        TimeStampToken::new(
            encoded,
            MessageImprint {
                algorithm: algorithm.oid().to_owned(),
                digest: imprint,
            },
        )
        .with_gen_time(time)
        .with_signer_info(SignerInfo {
            algorithm: ED25519_OID.to_owned(),
            public_key: self.key.verifying_key().to_bytes().to_vec(),
            signed_content: tst_info,
            signature,
        })
    }

    /// An archive time-stamp whose tree holds `leaves` in group 0 and `upper` above it. The
    /// token attests the recomputed root.
    pub fn archive_timestamp(
        &self,
        algorithm: DigestAlgorithm,
        leaves: Vec<DigestValue>,
        upper: Vec<Vec<DigestValue>>,
        time: DateTime<Utc>,
    ) -> ArchiveTimeStamp {
        let mut groups = vec![leaves];
        groups.extend(upper);
        let tree = HashTree::new(groups);
        let root = recompute_root(&tree, algorithm).unwrap();
        ArchiveTimeStamp::new(Some(tree), self.token(algorithm, root, time))
    }

    /// An archive time-stamp without hash tree, attesting `imprint` directly.
    pub fn bare_timestamp(
        &self,
        algorithm: DigestAlgorithm,
        imprint: DigestValue,
        time: DateTime<Utc>,
    ) -> ArchiveTimeStamp {
        ArchiveTimeStamp::new(None, self.token(algorithm, imprint, time))
    }
}

/// Digests of the standard objects, canonical order.
pub fn object_digests(algorithm: DigestAlgorithm) -> Vec<DigestValue> {
    [SIGNATURE, CERTIFICATE, OCSP]
        .iter()
        .map(|o| digest(algorithm, o))
        .collect()
}

/// Digest of the token of `ats`, as embedded by its successor.
pub fn token_digest(algorithm: DigestAlgorithm, ats: &ArchiveTimeStamp) -> DigestValue {
    digest(algorithm, ats.token().encoded())
}

pub fn flip(value: &DigestValue) -> DigestValue {
    let mut bytes = value.as_bytes().to_vec();
    bytes[0] ^= 0x01;
    DigestValue::from_bytes(&bytes).unwrap()
}

pub fn references() -> Vec<CoveredReference> {
    vec![
        CoveredReference::new(CoveredCategory::Signature, "signature"),
        CoveredReference::new(CoveredCategory::Certificate, "signing-cert"),
        CoveredReference::new(CoveredCategory::Revocation, "ocsp-1"),
    ]
}

pub fn covered() -> CoveredObjectSet<'static> {
    CoveredObjectSet::new()
        .with_bytes(CoveredCategory::Signature, "signature", SIGNATURE)
        .with_bytes(CoveredCategory::Certificate, "signing-cert", CERTIFICATE)
        .with_bytes(CoveredCategory::Revocation, "ocsp-1", OCSP)
}
