//! Continuity of the archive time-stamp sequence.
//!
//! The sequence is walked in order over `(chain, timestamp)` positions. Every time-stamp after
//! the first must contain the digest of its predecessor token in its leaf group: the previous
//! time-stamp of the same chain, or the last time-stamp of the previous chain when a new chain
//! starts (hash-tree renewal). A broken link or a failed time-stamp does not stop the walk;
//! the time-stamps after it are still verified but no longer inherit trust from the ones
//! before it.
use crate::archive_timestamp::{self, TimestampContext};
use crate::covered::{CoveredObjectSet, ExpectedLeaf};
use crate::digest::{digest, DigestAlgorithm};
use crate::errors::Error;
use crate::model::{ArchiveTimeStamp, EvidenceRecord, TimeStampToken};
use crate::traits::TsaVerifier;
use crate::verdict::{
    ChainLink, TimestampFailure, TimestampPosition, TimestampType, TimestampVerdict,
};
use tracing::{debug, warn};

/// State of the sequence walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Nothing seen yet.
    AwaitingFirst,
    /// Inside chain `chain`.
    InChain {
        /// Index of the current chain.
        chain: usize,
    },
    /// Chain `closed` is finished, the next one has not started.
    ChainBoundary {
        /// Index of the finished chain.
        closed: usize,
    },
    /// The whole sequence has been consumed.
    Terminal,
}

/// How a time-stamp relates to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First time-stamp of the first chain.
    First,
    /// Next time-stamp in the same chain.
    WithinChain,
    /// First time-stamp of a new chain.
    NewChain,
}

impl WalkState {
    /// Move to `position`.
    ///
    /// # Errors
    /// `Error::MalformedEvidenceRecord` when positions are not consecutive.
    pub fn advance(self, position: TimestampPosition) -> Result<(WalkState, Transition), Error> {
        let next = WalkState::InChain {
            chain: position.chain,
        };
        match (self, position) {
            (
                WalkState::AwaitingFirst,
                TimestampPosition {
                    chain: 0,
                    timestamp: 0,
                },
            ) => Ok((next, Transition::First)),
            (WalkState::InChain { chain }, p) if p.chain == chain && p.timestamp > 0 => {
                Ok((next, Transition::WithinChain))
            }
            (WalkState::ChainBoundary { closed }, p)
                if p.chain == closed + 1 && p.timestamp == 0 =>
            {
                Ok((next, Transition::NewChain))
            }
            (state, p) => Err(Error::MalformedEvidenceRecord(format!(
                "unexpected archive time-stamp {:?} in state {:?}",
                p, state
            ))),
        }
    }

    /// Close the current chain.
    pub fn close_chain(self) -> WalkState {
        match self {
            WalkState::InChain { chain } => WalkState::ChainBoundary { closed: chain },
            other => other,
        }
    }

    /// End the walk.
    pub fn finish(self) -> WalkState {
        WalkState::Terminal
    }
}

/// Verdicts and links of a whole sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityOutcome {
    /// One verdict per time-stamp, in sequence order.
    pub timestamps: Vec<TimestampVerdict>,
    /// One link per consecutive pair.
    pub links: Vec<ChainLink>,
}

impl ContinuityOutcome {
    /// Conjunction of all per-time-stamp outcomes.
    pub fn is_intact(&self) -> bool {
        self.timestamps.iter().all(TimestampVerdict::is_intact)
    }
}

/// A time-stamp of the same chain re-covers the objects when one of their digests is part of
/// its leaf group; otherwise it only renews the predecessor token.
fn recovers_objects(ats: &ArchiveTimeStamp, covered: &[ExpectedLeaf]) -> bool {
    ats.hash_tree().map_or(false, |tree| {
        covered
            .iter()
            .filter_map(|leaf| leaf.digest.as_ref())
            .any(|d| tree.leaves().contains(d))
    })
}

fn classify(
    transition: Transition,
    ats: &ArchiveTimeStamp,
    covered: &[ExpectedLeaf],
) -> TimestampType {
    match transition {
        Transition::First => TimestampType::ArchiveTimestamp,
        Transition::NewChain => TimestampType::HashTreeRenewal,
        Transition::WithinChain if recovers_objects(ats, covered) => {
            TimestampType::ArchiveTimestamp
        }
        Transition::WithinChain => TimestampType::TimestampRenewal,
    }
}

/// Walk the archive time-stamp sequence of `record`, verifying every time-stamp and every link.
///
/// # Errors
/// `Error::MalformedEvidenceRecord` when the sequence or one of its chains is empty. Every other
/// problem is reported in the outcome.
pub fn verify_sequence<T: TsaVerifier + ?Sized>(
    record: &EvidenceRecord,
    covered: &CoveredObjectSet<'_>,
    tsa: &T,
) -> Result<ContinuityOutcome, Error> {
    if record.sequence().is_empty() {
        return Err(Error::MalformedEvidenceRecord(
            "archive time-stamp sequence is empty".to_owned(),
        ));
    }

    let mut state = WalkState::AwaitingFirst;
    let mut timestamps = Vec::with_capacity(record.timestamp_count());
    let mut links = Vec::new();
    let mut previous: Option<(TimestampPosition, &TimeStampToken)> = None;
    let mut trusted_so_far = true;

    for (chain_index, chain) in record.sequence().iter().enumerate() {
        if chain.timestamps().is_empty() {
            return Err(Error::MalformedEvidenceRecord(format!(
                "archive time-stamp chain {} is empty",
                chain_index
            )));
        }
        let algorithm = DigestAlgorithm::from_identifier(chain.digest_algorithm());
        let leaves = match algorithm {
            Ok(alg) => covered.expected_leaves(record.references(), alg, record.incorporation()),
            Err(_) => covered.unresolved_leaves(record.references(), record.incorporation()),
        };

        for (timestamp_index, ats) in chain.timestamps().iter().enumerate() {
            let position = TimestampPosition {
                chain: chain_index,
                timestamp: timestamp_index,
            };
            let (next, transition) = state.advance(position)?;
            state = next;

            let timestamp_type = classify(transition, ats, &leaves);
            let context = TimestampContext {
                position,
                timestamp_type,
                covered: match timestamp_type {
                    TimestampType::TimestampRenewal => &[],
                    _ => &leaves[..],
                },
                chained: previous.is_some(),
                predecessor: match (&algorithm, previous) {
                    (Ok(alg), Some((_, token))) => Some(digest(*alg, token.encoded())),
                    _ => None,
                },
            };

            let mut verdict = match &algorithm {
                Ok(alg) => archive_timestamp::verify(ats, &context, *alg, tsa),
                Err(err) => archive_timestamp::failed_verdict(
                    ats,
                    &context,
                    None,
                    TimestampFailure::from(err.clone()),
                    tsa,
                ),
            };

            if let Some((from, _)) = previous {
                let intact = verdict.chaining_matcher().map_or(false, |m| m.data_intact);
                if intact {
                    debug!(?from, to = ?position, ?timestamp_type, "time-stamp link intact");
                } else {
                    warn!(?from, to = ?position, ?timestamp_type, "time-stamp link broken");
                }
                trusted_so_far &= intact;
                links.push(ChainLink {
                    from,
                    to: position,
                    timestamp_type,
                    intact,
                });
            }
            verdict.inherits_trust = trusted_so_far;
            trusted_so_far &= verdict.is_intact();

            timestamps.push(verdict);
            previous = Some((position, ats.token()));
        }
        state = state.close_chain();
    }
    state = state.finish();
    debug!(?state, timestamps = timestamps.len(), "archive time-stamp sequence walked");

    Ok(ContinuityOutcome { timestamps, links })
}
