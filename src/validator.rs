//! Evidence record validation: the chain walk, the optional incorporation check, and the
//! consolidated record verdict.
use crate::chain::{self, ContinuityOutcome};
use crate::covered::CoveredObjectSet;
use crate::digest::DigestAlgorithm;
use crate::errors::Error;
use crate::model::EvidenceRecord;
use crate::traits::TsaVerifier;
use crate::verdict::{
    CoveredCounts, DigestMatcher, EvidenceRecordVerdict, TimestampType, TimestampVerdict,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Options of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct VerifyConfig {
    /// The record is being applied to a signature for the first time. A record without hash
    /// tree whose first time-stamp does not attest the digest of that signature is then
    /// rejected with `Error::IncorporationMismatch` instead of being reported as not intact.
    pub incorporation_check: bool,
}

/// Evidence record validator, holding the time-stamp authority verifier.
///
/// A validator keeps no state between calls; one instance can validate any number of
/// independent records, from several threads.
#[derive(Debug, Clone)]
pub struct Validator<T> {
    tsa: T,
    config: VerifyConfig,
}

impl<T: TsaVerifier> Validator<T> {
    /// Validator with the default configuration.
    pub fn new(tsa: T) -> Self {
        Self {
            tsa,
            config: VerifyConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: VerifyConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Validate `record` against the objects it protects.
    ///
    /// # Errors
    /// * `Error::MalformedEvidenceRecord` if the sequence, or one of its chains, is empty
    /// * `Error::IncorporationMismatch` if the incorporation check is enabled and fails
    ///
    /// Every other problem is reported in the verdict.
    pub fn validate(
        &self,
        record: &EvidenceRecord,
        covered: &CoveredObjectSet<'_>,
    ) -> Result<EvidenceRecordVerdict, Error> {
        if self.config.incorporation_check {
            check_incorporation(record, covered)?;
        }

        let ContinuityOutcome { timestamps, links } =
            chain::verify_sequence(record, covered, &self.tsa)?;

        let digest_matchers: Vec<DigestMatcher> = timestamps
            .first()
            .map(|first| {
                first
                    .digest_matchers
                    .iter()
                    .filter(|m| m.matcher_type.is_covered_object())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut covered_counts = CoveredCounts::default();
        for reference in record.references() {
            if covered.get(reference.category, &reference.key).is_some() {
                covered_counts.add(reference.category);
            }
        }

        let overall_intact = timestamps.iter().all(TimestampVerdict::is_intact);
        let all_tokens_valid = timestamps.iter().all(|t| t.signature_valid);
        let proof_of_existence = proof_of_existence(&timestamps);

        info!(
            record_type = ?record.record_type(),
            incorporation = ?record.incorporation(),
            timestamps = timestamps.len(),
            overall_intact,
            all_tokens_valid,
            ?proof_of_existence,
            "evidence record validated"
        );

        Ok(EvidenceRecordVerdict {
            incorporation: record.incorporation(),
            digest_matchers,
            timestamps,
            links,
            covered_counts,
            overall_intact,
            all_tokens_valid,
            proof_of_existence,
        })
    }
}

/// Validate `record` with the default configuration.
///
/// # Errors
/// See [`Validator::validate`].
pub fn validate<T: TsaVerifier>(
    record: &EvidenceRecord,
    covered: &CoveredObjectSet<'_>,
    tsa: T,
) -> Result<EvidenceRecordVerdict, Error> {
    Validator::new(tsa).validate(record, covered)
}

/// A record without hash tree in its first time-stamp attests exactly one digest, which must
/// be the digest of the sole object it is applied to.
fn check_incorporation(
    record: &EvidenceRecord,
    covered: &CoveredObjectSet<'_>,
) -> Result<(), Error> {
    let first_chain = match record.sequence().first() {
        Some(chain) => chain,
        None => return Ok(()),
    };
    let first = match first_chain.timestamps().first() {
        Some(ats) if ats.hash_tree().is_none() => ats,
        _ => return Ok(()),
    };

    let attested = &first.token().message_imprint().digest;
    let computed = DigestAlgorithm::from_identifier(first_chain.digest_algorithm())
        .ok()
        .and_then(|alg| {
            match covered
                .expected_leaves(record.references(), alg, record.incorporation())
                .as_slice()
            {
                [single] => single.digest.clone(),
                _ => None,
            }
        });

    if computed.as_ref() == Some(attested) {
        debug!(digest = %attested, "evidence record incorporation checked");
        Ok(())
    } else {
        warn!(
            attested = %attested,
            computed = ?computed,
            "evidence record does not attest the digest of the signature it is applied to"
        );
        Err(Error::IncorporationMismatch)
    }
}

/// The time-stamp covers the objects directly, and all of them matched.
fn covers_objects(verdict: &TimestampVerdict) -> bool {
    let mut covered = verdict
        .digest_matchers
        .iter()
        .filter(|m| m.matcher_type.is_covered_object())
        .peekable();
    verdict.timestamp_type != TimestampType::TimestampRenewal
        && verdict.failure.is_none()
        && verdict.message_imprint_intact
        && covered.peek().is_some()
        && covered.all(|m| m.data_intact)
}

/// Trusted time of the earliest time-stamp covering the objects from which every later
/// time-stamp, and so every later link, is intact.
fn proof_of_existence(timestamps: &[TimestampVerdict]) -> Option<DateTime<Utc>> {
    timestamps.iter().enumerate().find_map(|(index, verdict)| {
        let later_intact = timestamps[index + 1..].iter().all(TimestampVerdict::is_intact);
        if covers_objects(verdict) && later_intact {
            verdict.trusted_time
        } else {
            None
        }
    })
}
