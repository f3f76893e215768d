//! Verification of a single archive time-stamp: hash tree against the expected leaves and the
//! message imprint, plus the delegated token signature check.
use crate::common::DigestValue;
use crate::covered::ExpectedLeaf;
use crate::digest::DigestAlgorithm;
use crate::errors::Error;
use crate::hash_tree;
use crate::model::ArchiveTimeStamp;
use crate::traits::{TokenValidation, TsaVerifier};
use crate::verdict::{
    DigestMatcher, DigestMatcherType, TimestampFailure, TimestampPosition, TimestampType,
    TimestampVerdict,
};
use tracing::{debug, warn};

/// What an archive time-stamp is checked against.
#[derive(Debug, Clone)]
pub struct TimestampContext<'c> {
    /// Where the time-stamp sits.
    pub position: TimestampPosition,
    /// Its role, as classified by the chain walk.
    pub timestamp_type: TimestampType,
    /// Covered objects it must contain, empty for a time-stamp renewal.
    pub covered: &'c [ExpectedLeaf],
    /// The time-stamp renews a predecessor token.
    pub chained: bool,
    /// Digest of the predecessor token with the chain algorithm, when it could be computed.
    pub predecessor: Option<DigestValue>,
}

impl From<Error> for TimestampFailure {
    fn from(err: Error) -> Self {
        match err {
            Error::UnsupportedAlgorithm(id) => TimestampFailure::UnsupportedAlgorithm(id),
            other => TimestampFailure::MalformedHashTree(other.to_string()),
        }
    }
}

fn token_validation<T: TsaVerifier + ?Sized>(
    ats: &ArchiveTimeStamp,
    tsa: &T,
    position: TimestampPosition,
) -> (TokenValidation, Option<TimestampFailure>) {
    match tsa.verify(ats.token()) {
        Ok(validation) => (validation, None),
        Err(Error::UnsupportedAlgorithm(id)) => {
            warn!(?position, algorithm = %id, "time-stamp token signature algorithm not supported");
            (
                TokenValidation::default(),
                Some(TimestampFailure::UnsupportedAlgorithm(id)),
            )
        }
        Err(err) => {
            debug!(?position, error = %err, "time-stamp token signature does not decode");
            (TokenValidation::default(), None)
        }
    }
}

/// Matchers for a time-stamp whose tree could not be evaluated: nothing is intact.
fn unevaluated_matchers(
    context: &TimestampContext<'_>,
    algorithm: Option<DigestAlgorithm>,
) -> Vec<DigestMatcher> {
    let mut matchers = vec![DigestMatcher {
        matcher_type: DigestMatcherType::MessageImprint,
        key: None,
        digest_algorithm: algorithm,
        digest_value: None,
        data_found: true,
        data_intact: false,
    }];
    if context.chained {
        matchers.push(DigestMatcher {
            matcher_type: DigestMatcherType::EvidenceRecordArchiveTimeStamp,
            key: None,
            digest_algorithm: algorithm,
            digest_value: context.predecessor.clone(),
            data_found: context.predecessor.is_some(),
            data_intact: false,
        });
    }
    for leaf in context.covered {
        let mut matcher =
            DigestMatcher::not_found(leaf.matcher_type, Some(leaf.reference.key.clone()));
        matcher.digest_algorithm = algorithm;
        matcher.data_found = leaf.found;
        matcher.digest_value = leaf.digest.clone();
        matchers.push(matcher);
    }
    matchers
}

/// Verdict for a time-stamp that failed before its tree could be evaluated. `algorithm` is
/// `None` when the chain algorithm itself is unknown.
pub fn failed_verdict<T: TsaVerifier + ?Sized>(
    ats: &ArchiveTimeStamp,
    context: &TimestampContext<'_>,
    algorithm: Option<DigestAlgorithm>,
    failure: TimestampFailure,
    tsa: &T,
) -> TimestampVerdict {
    let (validation, _) = token_validation(ats, tsa, context.position);
    warn!(position = ?context.position, ?failure, "archive time-stamp not evaluated");
    TimestampVerdict {
        position: context.position,
        timestamp_type: context.timestamp_type,
        digest_matchers: unevaluated_matchers(context, algorithm),
        computed_root: None,
        message_imprint_found: true,
        message_imprint_intact: false,
        signature_intact: validation.signature_intact,
        signature_valid: validation.signature_valid,
        trusted_time: validation.trusted_time,
        inherits_trust: true,
        failure: Some(failure),
    }
}

/// Verify one archive time-stamp. Soft failures end up in the verdict; a malformed tree or an
/// unknown algorithm sets its `failure` without affecting any other time-stamp.
pub fn verify<T: TsaVerifier + ?Sized>(
    ats: &ArchiveTimeStamp,
    context: &TimestampContext<'_>,
    algorithm: DigestAlgorithm,
    tsa: &T,
) -> TimestampVerdict {
    let imprint = ats.token().message_imprint();
    match DigestAlgorithm::from_identifier(&imprint.algorithm) {
        Ok(alg) if alg != algorithm => {
            warn!(
                position = ?context.position,
                chain = %algorithm,
                imprint = %alg,
                "message imprint algorithm differs from the chain algorithm"
            );
        }
        Ok(_) => {}
        Err(err) => return failed_verdict(ats, context, Some(algorithm), err.into(), tsa),
    }

    let mut expected: Vec<Option<DigestValue>> = Vec::with_capacity(context.covered.len() + 1);
    if context.chained {
        expected.push(context.predecessor.clone());
    }
    expected.extend(context.covered.iter().map(|leaf| leaf.digest.clone()));

    let outcome = match hash_tree::verify(ats.hash_tree(), &expected, algorithm, &imprint.digest)
    {
        Ok(outcome) => outcome,
        Err(err) => return failed_verdict(ats, context, Some(algorithm), err.into(), tsa),
    };
    if !outcome.matched {
        warn!(
            position = ?context.position,
            imprint = %imprint.digest,
            "recomputed hash tree root does not match the message imprint"
        );
    }

    let mut found = outcome.leaves_found.iter().copied();
    let mut matchers = vec![DigestMatcher {
        matcher_type: DigestMatcherType::MessageImprint,
        key: None,
        digest_algorithm: Some(algorithm),
        digest_value: outcome.computed_root.clone(),
        data_found: true,
        data_intact: outcome.matched,
    }];
    if context.chained {
        matchers.push(DigestMatcher {
            matcher_type: DigestMatcherType::EvidenceRecordArchiveTimeStamp,
            key: None,
            digest_algorithm: Some(algorithm),
            digest_value: context.predecessor.clone(),
            data_found: context.predecessor.is_some(),
            data_intact: found.next().unwrap_or(false),
        });
    }
    for leaf in context.covered {
        matchers.push(DigestMatcher {
            matcher_type: leaf.matcher_type,
            key: Some(leaf.reference.key.clone()),
            digest_algorithm: Some(algorithm),
            digest_value: leaf.digest.clone(),
            data_found: leaf.found,
            data_intact: found.next().unwrap_or(false),
        });
    }

    let (validation, failure) = token_validation(ats, tsa, context.position);
    debug!(
        position = ?context.position,
        timestamp_type = ?context.timestamp_type,
        matched = outcome.matched,
        signature_valid = validation.signature_valid,
        "archive time-stamp verified"
    );

    TimestampVerdict {
        position: context.position,
        timestamp_type: context.timestamp_type,
        digest_matchers: matchers,
        computed_root: outcome.computed_root,
        message_imprint_found: true,
        message_imprint_intact: outcome.matched,
        signature_intact: validation.signature_intact,
        signature_valid: validation.signature_valid,
        trusted_time: validation.trusted_time,
        inherits_trust: true,
        failure,
    }
}
