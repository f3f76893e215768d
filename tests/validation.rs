mod common;

use common::*;
use evidence_record_verify::common::DigestValue;
use evidence_record_verify::covered::CoveredObjectSet;
use evidence_record_verify::digest::{digest, DigestAlgorithm};
use evidence_record_verify::errors::{Error, INCORPORATION_MISMATCH_MESSAGE};
use evidence_record_verify::model::{
    ArchiveTimeStamp, ArchiveTimeStampChain, CoveredCategory, CoveredReference, EvidenceRecord,
    EvidenceRecordType, HashTree, IncorporationType,
};
use evidence_record_verify::tsa::Ed25519TsaVerifier;
use evidence_record_verify::verdict::{
    DigestMatcherType, Renewal, TimestampFailure, TimestampType,
};
use evidence_record_verify::{validate, Indication, SubIndication, Validator, VerifyConfig};

const SHA256: DigestAlgorithm = DigestAlgorithm::Sha256;
const SHA512: DigestAlgorithm = DigestAlgorithm::Sha512;

fn internal_record(sequence: Vec<ArchiveTimeStampChain>) -> EvidenceRecord {
    EvidenceRecord::new(EvidenceRecordType::Asn1, IncorporationType::Internal, sequence)
        .with_references(references())
}

fn chain(algorithm: DigestAlgorithm, timestamps: Vec<ArchiveTimeStamp>) -> ArchiveTimeStampChain {
    ArchiveTimeStampChain::new(algorithm.oid(), timestamps)
}

/// Chain 0 over the objects with SHA-256, then a hash-tree renewal with SHA-512 embedding
/// `predecessor` (the correct token digest when `None`).
fn hash_tree_renewal(tsu: &Tsu, predecessor: Option<DigestValue>) -> EvidenceRecord {
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2015, 6, 1));
    let predecessor = predecessor.unwrap_or_else(|| token_digest(SHA512, &first));
    let mut leaves = vec![predecessor];
    leaves.extend(object_digests(SHA512));
    let renewal = tsu.archive_timestamp(SHA512, leaves, vec![], at(2022, 6, 1));
    internal_record(vec![chain(SHA256, vec![first]), chain(SHA512, vec![renewal])])
}

#[test]
fn validation_is_idempotent() {
    let tsu = Tsu::new(1);
    let record = hash_tree_renewal(&tsu, None);
    let covered = covered();
    let validator = Validator::new(tsu.verifier());

    let first = validator.validate(&record, &covered).unwrap();
    let second = validator.validate(&record, &covered).unwrap();
    assert_eq!(first, second);
}

#[test]
fn hash_tree_renewal_is_intact() {
    let tsu = Tsu::new(1);
    let record = hash_tree_renewal(&tsu, None);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    assert!(verdict.overall_intact);
    assert!(verdict.all_tokens_valid);
    assert_eq!(verdict.timestamps.len(), 2);
    assert_eq!(verdict.links.len(), 1);
    assert!(verdict.links[0].intact);
    assert_eq!(verdict.links[0].timestamp_type, TimestampType::HashTreeRenewal);

    let renewal = verdict.timestamp(1, 0).unwrap();
    assert_eq!(renewal.renewal(), Some(Renewal::HashTreeRenewal));
    assert!(renewal.inherits_trust);
    assert_eq!(renewal.chaining_matcher().unwrap().digest_algorithm, Some(SHA512));
    assert_eq!(
        renewal
            .matchers_of(DigestMatcherType::EvidenceRecordCertificate)
            .count(),
        1
    );
    for ts in &verdict.timestamps {
        assert_eq!(ts.indication(), (Indication::Passed, None));
    }
    assert_eq!(verdict.indication(), (Indication::Passed, None));

    assert_eq!(verdict.proof_of_existence, Some(at(2015, 6, 1)));
    assert_eq!(verdict.digest_matchers.len(), 3);
    assert_eq!(
        verdict.digest_matchers[0].matcher_type,
        DigestMatcherType::EvidenceRecordMasterSignature
    );
    assert_eq!(verdict.covered_counts.signatures, 1);
    assert_eq!(verdict.covered_counts.certificates, 1);
    assert_eq!(verdict.covered_counts.revocations, 1);
}

#[test]
fn corrupted_predecessor_breaks_the_link_only() {
    let tsu = Tsu::new(1);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2015, 6, 1));
    let corrupted = flip(&token_digest(SHA512, &first));
    let record = hash_tree_renewal(&tsu, Some(corrupted));
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let chain0 = verdict.timestamp(0, 0).unwrap();
    assert!(chain0.is_intact());
    assert_eq!(chain0.indication(), (Indication::Passed, None));

    let renewal = verdict.timestamp(1, 0).unwrap();
    assert!(renewal.message_imprint_intact);
    let chaining = renewal.chaining_matcher().unwrap();
    assert!(chaining.data_found);
    assert!(!chaining.data_intact);
    assert!(!renewal.inherits_trust);
    assert_eq!(
        renewal.indication(),
        (Indication::Failed, Some(SubIndication::HashFailure))
    );

    assert!(!verdict.links[0].intact);
    assert!(!verdict.overall_intact);
    // The renewal still re-covers the objects on its own.
    assert_eq!(verdict.proof_of_existence, Some(at(2022, 6, 1)));
}

#[test]
fn timestamp_renewal() {
    let tsu = Tsu::new(2);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2016, 1, 1));
    let renewal = tsu.archive_timestamp(
        SHA256,
        vec![token_digest(SHA256, &first)],
        vec![],
        at(2019, 1, 1),
    );
    let record = internal_record(vec![chain(SHA256, vec![first, renewal])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    assert!(verdict.overall_intact);
    let renewal = verdict.timestamp(0, 1).unwrap();
    assert_eq!(renewal.timestamp_type, TimestampType::TimestampRenewal);
    assert_eq!(renewal.renewal(), Some(Renewal::TimeStampRenewal));
    // A time-stamp renewal only protects its predecessor.
    assert_eq!(renewal.digest_matchers.len(), 2);
    assert_eq!(verdict.proof_of_existence, Some(at(2016, 1, 1)));
}

#[test]
fn timestamp_renewal_without_tree() {
    let tsu = Tsu::new(2);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2016, 1, 1));
    let renewal = tsu.bare_timestamp(SHA256, token_digest(SHA256, &first), at(2019, 1, 1));
    let record = internal_record(vec![chain(SHA256, vec![first, renewal])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let renewal = verdict.timestamp(0, 1).unwrap();
    assert_eq!(renewal.timestamp_type, TimestampType::TimestampRenewal);
    assert!(renewal.is_intact());
    assert!(renewal.chaining_matcher().unwrap().data_intact);
    assert_eq!(renewal.indication(), (Indication::Passed, None));
    assert!(verdict.links[0].intact);
    assert!(verdict.overall_intact);
    assert_eq!(verdict.indication(), (Indication::Passed, None));
    assert_eq!(verdict.proof_of_existence, Some(at(2016, 1, 1)));
}

#[test]
fn timestamp_renewal_over_wrong_predecessor() {
    let tsu = Tsu::new(2);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2016, 1, 1));
    let wrong = flip(&token_digest(SHA256, &first));
    let renewal = tsu.archive_timestamp(SHA256, vec![wrong], vec![], at(2019, 1, 1));
    let record = internal_record(vec![chain(SHA256, vec![first, renewal])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let renewal = verdict.timestamp(0, 1).unwrap();
    assert_eq!(renewal.timestamp_type, TimestampType::TimestampRenewal);
    assert_eq!(renewal.digest_matchers.len(), 2);
    assert!(renewal.message_imprint_intact);
    let chaining = renewal.chaining_matcher().unwrap();
    assert!(chaining.data_found);
    assert!(!chaining.data_intact);
    assert_eq!(
        renewal.indication(),
        (Indication::Failed, Some(SubIndication::HashFailure))
    );
    assert!(!verdict.links[0].intact);
    assert!(!verdict.overall_intact);
    assert_eq!(
        verdict.indication(),
        (Indication::Failed, Some(SubIndication::HashFailure))
    );
}

#[test]
fn timestamp_renewal_with_imprint_mismatch() {
    let tsu = Tsu::new(2);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2016, 1, 1));
    let predecessor = token_digest(SHA256, &first);
    let renewal = tsu.bare_timestamp(SHA256, flip(&predecessor), at(2019, 1, 1));
    let renewal = ArchiveTimeStamp::new(
        Some(HashTree::new(vec![vec![predecessor]])),
        renewal.token().clone(),
    );
    let record = internal_record(vec![chain(SHA256, vec![first, renewal])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let indications: Vec<_> = verdict.timestamps.iter().map(|t| t.indication()).collect();
    assert_eq!(
        indications,
        vec![
            (Indication::Passed, None),
            (Indication::Failed, Some(SubIndication::HashFailure)),
        ]
    );
    assert_eq!(verdict.timestamps[1].timestamp_type, TimestampType::TimestampRenewal);
    assert!(verdict.links[0].intact);
    assert!(!verdict.overall_intact);
    assert_eq!(verdict.proof_of_existence, None);
}

#[test]
fn second_archive_timestamp_in_chain_recovering_objects() {
    let tsu = Tsu::new(2);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2016, 1, 1));
    let mut leaves = vec![token_digest(SHA256, &first)];
    leaves.extend(object_digests(SHA256));
    let second = tsu.archive_timestamp(SHA256, leaves, vec![], at(2017, 1, 1));
    let record = internal_record(vec![chain(SHA256, vec![first, second])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let second = verdict.timestamp(0, 1).unwrap();
    assert_eq!(second.timestamp_type, TimestampType::ArchiveTimestamp);
    assert_eq!(second.digest_matchers.len(), 5);
    assert!(verdict.overall_intact);
}

#[test]
fn upper_groups_are_climbed() {
    let tsu = Tsu::new(3);
    let other_record = digest(SHA256, b"unrelated neighbour");
    let sibling = digest(SHA256, b"sibling subtree");
    let ats = tsu.archive_timestamp(
        SHA256,
        object_digests(SHA256),
        vec![vec![other_record], vec![sibling]],
        at(2018, 3, 3),
    );
    let record = internal_record(vec![chain(SHA256, vec![ats])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();
    assert!(verdict.overall_intact);
    assert!(verdict.timestamps[0].computed_root.is_some());
}

#[test]
fn single_object_without_tree() {
    let tsu = Tsu::new(4);
    let sole = vec![CoveredReference::new(CoveredCategory::Signature, "signature")];
    let covered = CoveredObjectSet::new().with_bytes(
        CoveredCategory::Signature,
        "signature",
        SIGNATURE,
    );
    let strict = Validator::new(tsu.verifier()).with_config(VerifyConfig {
        incorporation_check: true,
    });

    let exact = tsu.bare_timestamp(SHA256, digest(SHA256, SIGNATURE), at(2020, 2, 2));
    let record = internal_record(vec![chain(SHA256, vec![exact])]).with_references(sole.clone());
    let verdict = strict.validate(&record, &covered).unwrap();
    assert!(verdict.overall_intact);
    assert_eq!(verdict.proof_of_existence, Some(at(2020, 2, 2)));

    let flipped = tsu.bare_timestamp(SHA256, flip(&digest(SHA256, SIGNATURE)), at(2020, 2, 2));
    let record = internal_record(vec![chain(SHA256, vec![flipped])]).with_references(sole);
    let verdict = validate(&record, &covered, tsu.verifier()).unwrap();
    assert!(!verdict.overall_intact);
    assert!(!verdict.digest_matchers[0].data_intact);
    assert_eq!(
        verdict.timestamps[0].indication(),
        (Indication::Failed, Some(SubIndication::HashFailure))
    );
    assert_eq!(
        strict.validate(&record, &covered),
        Err(Error::IncorporationMismatch)
    );
}

#[test]
fn detached_document_mismatch() {
    let tsu = Tsu::new(5);
    let document = digest(SHA256, b"detached contract, version 1");
    let record = EvidenceRecord::new(
        EvidenceRecordType::Xml,
        IncorporationType::External,
        vec![chain(
            SHA256,
            vec![tsu.bare_timestamp(SHA256, document.clone(), at(2021, 9, 9))],
        )],
    )
    .with_references(vec![CoveredReference::new(
        CoveredCategory::SignedData,
        "contract.pdf",
    )]);
    let strict = Validator::new(tsu.verifier()).with_config(VerifyConfig {
        incorporation_check: true,
    });

    let matching = CoveredObjectSet::new().with_digest("contract.pdf", SHA256, document);
    let verdict = strict.validate(&record, &matching).unwrap();
    assert!(verdict.overall_intact);
    assert_eq!(verdict.covered_counts.signed_data, 1);
    assert_eq!(
        verdict.digest_matchers[0].matcher_type,
        DigestMatcherType::EvidenceRecordSignedData
    );

    let other = CoveredObjectSet::new().with_digest(
        "contract.pdf",
        SHA256,
        digest(SHA256, b"detached contract, version 2"),
    );
    let err = strict.validate(&record, &other).unwrap_err();
    assert_eq!(err, Error::IncorporationMismatch);
    assert_eq!(err.to_string(), INCORPORATION_MISMATCH_MESSAGE);
}

#[test]
fn broken_renewal_across_three_chains() {
    let tsu = Tsu::new(6);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2010, 1, 1));

    let mut leaves = vec![flip(&token_digest(SHA512, &first))];
    leaves.extend(object_digests(SHA512));
    let second = tsu.archive_timestamp(SHA512, leaves, vec![], at(2015, 1, 1));

    let mut leaves = vec![token_digest(SHA256, &second)];
    leaves.extend(object_digests(SHA256));
    let third = tsu.archive_timestamp(SHA256, leaves, vec![], at(2020, 1, 1));

    let record = internal_record(vec![
        chain(SHA256, vec![first]),
        chain(SHA512, vec![second]),
        chain(SHA256, vec![third]),
    ]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let links: Vec<bool> = verdict.links.iter().map(|l| l.intact).collect();
    assert_eq!(links, vec![false, true]);
    let inherits: Vec<bool> = verdict.timestamps.iter().map(|t| t.inherits_trust).collect();
    assert_eq!(inherits, vec![true, false, false]);
    assert!(verdict.timestamps[2].is_intact());
    assert!(!verdict.overall_intact);
    // The broken hash-tree renewal still re-covers the objects on its own.
    assert_eq!(verdict.proof_of_existence, Some(at(2015, 1, 1)));
}

#[test]
fn untrusted_time_stamping_unit() {
    let tsu = Tsu::new(7);
    let record = hash_tree_renewal(&tsu, None);
    let verdict = validate(&record, &covered(), Ed25519TsaVerifier::new()).unwrap();

    assert!(verdict.overall_intact);
    assert!(!verdict.all_tokens_valid);
    assert_eq!(verdict.proof_of_existence, None);
    for ts in &verdict.timestamps {
        assert!(ts.signature_intact);
        assert_eq!(
            ts.indication(),
            (
                Indication::Indeterminate,
                Some(SubIndication::CertificateChainGeneralFailure)
            )
        );
    }
    assert_eq!(
        verdict.indication(),
        (
            Indication::Indeterminate,
            Some(SubIndication::CertificateChainGeneralFailure)
        )
    );
}

#[test]
fn tampered_token_signature() {
    let tsu = Tsu::new(8);
    let ats = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2018, 8, 8));
    let mut signer = ats.token().signer_info().cloned().unwrap();
    signer.signature[10] ^= 0x40;
    let token = ats.token().clone().with_signer_info(signer);
    let ats = ArchiveTimeStamp::new(ats.hash_tree().cloned(), token);

    let record = internal_record(vec![chain(SHA256, vec![ats])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();
    assert!(verdict.overall_intact);
    assert!(!verdict.timestamps[0].signature_intact);
    assert_eq!(
        verdict.timestamps[0].indication(),
        (Indication::Failed, Some(SubIndication::SigCryptoFailure))
    );
}

#[test]
fn unknown_chain_algorithm_fails_that_chain_only() {
    let tsu = Tsu::new(9);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2012, 1, 1));
    let mut leaves = vec![token_digest(SHA512, &first)];
    leaves.extend(object_digests(SHA512));
    let second = tsu.archive_timestamp(SHA512, leaves, vec![], at(2014, 1, 1));
    let record = internal_record(vec![
        ArchiveTimeStampChain::new("1.2.3.4.5", vec![first]),
        chain(SHA512, vec![second]),
    ]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let failed = verdict.timestamp(0, 0).unwrap();
    assert_eq!(
        failed.failure,
        Some(TimestampFailure::UnsupportedAlgorithm("1.2.3.4.5".to_owned()))
    );
    assert_eq!(
        failed.indication(),
        (
            Indication::Indeterminate,
            Some(SubIndication::CryptoConstraintsFailure)
        )
    );
    assert!(failed.signature_valid);

    let renewal = verdict.timestamp(1, 0).unwrap();
    assert!(renewal.is_intact());
    assert!(!renewal.inherits_trust);
    assert_eq!(verdict.proof_of_existence, Some(at(2014, 1, 1)));
}

#[test]
fn malformed_tree_fails_that_timestamp_only() {
    let tsu = Tsu::new(10);
    let first = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2012, 1, 1));
    let broken = ArchiveTimeStamp::new(
        Some(HashTree::new(vec![
            vec![token_digest(SHA256, &first)],
            vec![],
        ])),
        tsu.token(SHA256, digest(SHA256, b"whatever"), at(2013, 1, 1)),
    );
    let record = internal_record(vec![chain(SHA256, vec![first, broken])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    assert!(verdict.timestamps[0].is_intact());
    let broken = &verdict.timestamps[1];
    assert!(matches!(
        broken.failure,
        Some(TimestampFailure::MalformedHashTree(_))
    ));
    assert_eq!(
        broken.indication(),
        (Indication::Failed, Some(SubIndication::FormatFailure))
    );
    assert!(!verdict.overall_intact);
}

#[test]
fn missing_covered_object() {
    let tsu = Tsu::new(11);
    let ats = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2018, 1, 1));
    let record = internal_record(vec![chain(SHA256, vec![ats])]);
    let covered = CoveredObjectSet::new()
        .with_bytes(CoveredCategory::Signature, "signature", SIGNATURE)
        .with_bytes(CoveredCategory::Certificate, "signing-cert", CERTIFICATE);
    let verdict = validate(&record, &covered, tsu.verifier()).unwrap();

    let ocsp = verdict
        .digest_matchers
        .iter()
        .find(|m| m.matcher_type == DigestMatcherType::EvidenceRecordRevocation)
        .unwrap();
    assert!(!ocsp.data_found);
    assert!(!ocsp.data_intact);
    assert_eq!(verdict.covered_counts.revocations, 0);
    assert!(!verdict.overall_intact);
    // The tree itself is sound.
    assert_eq!(
        verdict.timestamps[0].indication(),
        (Indication::Passed, None)
    );
}

#[test]
fn tampered_certificate_fails_the_record() {
    let tsu = Tsu::new(12);
    let ats = tsu.archive_timestamp(SHA256, object_digests(SHA256), vec![], at(2018, 1, 1));
    let record = internal_record(vec![chain(SHA256, vec![ats])]);
    let covered = CoveredObjectSet::new()
        .with_bytes(CoveredCategory::Signature, "signature", SIGNATURE)
        .with_bytes(CoveredCategory::Certificate, "signing-cert", b"30820311 another certificate")
        .with_bytes(CoveredCategory::Revocation, "ocsp-1", OCSP);
    let verdict = validate(&record, &covered, tsu.verifier()).unwrap();

    let certificate = verdict
        .digest_matchers
        .iter()
        .find(|m| m.matcher_type == DigestMatcherType::EvidenceRecordCertificate)
        .unwrap();
    assert!(certificate.data_found);
    assert!(!certificate.data_intact);
    assert_eq!(
        verdict.timestamps[0].indication(),
        (Indication::Passed, None)
    );
    assert_eq!(
        verdict.indication(),
        (Indication::Failed, Some(SubIndication::HashFailure))
    );
    assert_eq!(verdict.proof_of_existence, None);
}

#[test]
fn object_missing_from_tree_fails_the_record() {
    let tsu = Tsu::new(12);
    let leaves = vec![digest(SHA256, SIGNATURE), digest(SHA256, CERTIFICATE)];
    let ats = tsu.archive_timestamp(SHA256, leaves, vec![], at(2018, 1, 1));
    let record = internal_record(vec![chain(SHA256, vec![ats])]);
    let verdict = validate(&record, &covered(), tsu.verifier()).unwrap();

    let ocsp = verdict
        .digest_matchers
        .iter()
        .find(|m| m.matcher_type == DigestMatcherType::EvidenceRecordRevocation)
        .unwrap();
    assert!(ocsp.data_found);
    assert!(!ocsp.data_intact);
    assert!(verdict.timestamps[0].message_imprint_intact);
    assert_eq!(
        verdict.indication(),
        (Indication::Failed, Some(SubIndication::HashFailure))
    );
}

#[test]
fn signature_timestamp_is_covered() {
    let tsu = Tsu::new(13);
    let signature_timestamp: &[u8] = b"3082048a signature time-stamp token";
    let mut leaves = object_digests(SHA256);
    leaves.push(digest(SHA256, signature_timestamp));
    let ats = tsu.archive_timestamp(SHA256, leaves, vec![], at(2019, 5, 5));

    let mut with_timestamp = references();
    with_timestamp.push(CoveredReference::new(CoveredCategory::Timestamp, "signature-tst"));
    let record = internal_record(vec![chain(SHA256, vec![ats])]).with_references(with_timestamp);
    let covered = covered().with_bytes(
        CoveredCategory::Timestamp,
        "signature-tst",
        signature_timestamp,
    );
    let verdict = validate(&record, &covered, tsu.verifier()).unwrap();

    assert!(verdict.overall_intact);
    assert_eq!(verdict.covered_counts.timestamps, 1);
    let types: Vec<DigestMatcherType> =
        verdict.digest_matchers.iter().map(|m| m.matcher_type).collect();
    assert_eq!(
        types,
        vec![
            DigestMatcherType::EvidenceRecordMasterSignature,
            DigestMatcherType::EvidenceRecordCertificate,
            DigestMatcherType::EvidenceRecordRevocation,
            DigestMatcherType::EvidenceRecordTimestamp,
        ]
    );
    assert!(verdict.digest_matchers.iter().all(|m| m.data_intact));
    assert_eq!(verdict.indication(), (Indication::Passed, None));
}
