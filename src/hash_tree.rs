//! Hash tree verification. Recomputes the root of a reduced hash tree, level by level, and
//! compares it with the message imprint of the time-stamp token protecting it.
//!
//! At every level the node group is sorted in ascending binary order, concatenated and hashed.
//! The resulting value joins the next group as one more sibling, until no group is left. A
//! leaf group holding a single digest is not hashed: the digest is the accumulator itself
//! (reduced hash tree protecting one object).
use crate::common::DigestValue;
use crate::digest::{digest_parts, DigestAlgorithm};
use crate::errors::Error;
use crate::model::HashTree;

/// Outcome of a hash tree verification. A mismatch is reported here, never as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTreeOutcome {
    /// The recomputed root equals the message imprint.
    pub matched: bool,
    /// The recomputed root, `None` when there is no tree and the single leaf is unknown.
    pub computed_root: Option<DigestValue>,
    /// For every expected leaf, whether it is part of the leaf group (or equals the imprint
    /// when there is no tree).
    pub leaves_found: Vec<bool>,
}

impl HashTreeOutcome {
    /// Every expected leaf was found and the root matched.
    pub fn is_intact(&self) -> bool {
        self.matched && self.leaves_found.iter().all(|found| *found)
    }
}

/// Hash the ascending-sorted concatenation of `values`.
pub fn hash_group<'a, I>(algorithm: DigestAlgorithm, values: I) -> DigestValue
where
    I: IntoIterator<Item = &'a DigestValue>,
{
    let mut sorted: Vec<&DigestValue> = values.into_iter().collect();
    sorted.sort();
    let parts: Vec<&[u8]> = sorted.iter().map(|v| v.as_bytes()).collect();
    digest_parts(algorithm, &parts)
}

/// Recompute the root of `tree`.
///
/// # Errors
/// The function fails with `Error::MalformedHashTree` if
/// * the tree has no node group
/// * one of its node groups is empty
pub fn recompute_root(tree: &HashTree, algorithm: DigestAlgorithm) -> Result<DigestValue, Error> {
    let (leaves, upper) = tree
        .groups()
        .split_first()
        .ok_or_else(|| Error::MalformedHashTree("hash tree has no node group".to_owned()))?;

    let mut accumulator = match leaves.as_slice() {
        [] => {
            return Err(Error::MalformedHashTree(
                "leaf node group is empty".to_owned(),
            ))
        }
        [single] => single.clone(),
        _ => hash_group(algorithm, leaves),
    };

    for (level, siblings) in upper.iter().enumerate() {
        if siblings.is_empty() {
            return Err(Error::MalformedHashTree(format!(
                "node group {} is empty",
                level + 1
            )));
        }
        accumulator = hash_group(algorithm, siblings.iter().chain(std::iter::once(&accumulator)));
    }

    Ok(accumulator)
}

/// Verify `tree` against the digests it is expected to contain and the imprint it must produce.
///
/// `expected_leaves` holds `None` for objects whose digest could not be computed; they are
/// reported as not found.
///
/// # Errors
/// `Error::MalformedHashTree` when the tree is structurally inconsistent, or when there is no
/// tree and the number of expected leaves is not exactly one.
pub fn verify(
    tree: Option<&HashTree>,
    expected_leaves: &[Option<DigestValue>],
    algorithm: DigestAlgorithm,
    imprint: &DigestValue,
) -> Result<HashTreeOutcome, Error> {
    match tree {
        None => {
            let leaf = match expected_leaves {
                [leaf] => leaf,
                _ => {
                    return Err(Error::MalformedHashTree(format!(
                        "a time-stamp without hash tree attests exactly one digest, {} expected",
                        expected_leaves.len()
                    )))
                }
            };
            let matched = leaf.as_ref() == Some(imprint);
            Ok(HashTreeOutcome {
                matched,
                computed_root: leaf.clone(),
                leaves_found: vec![matched],
            })
        }
        Some(tree) => {
            let root = recompute_root(tree, algorithm)?;
            let leaves_found = expected_leaves
                .iter()
                .map(|expected| match expected {
                    Some(digest) => tree.leaves().contains(digest),
                    None => false,
                })
                .collect();
            Ok(HashTreeOutcome {
                matched: &root == imprint,
                computed_root: Some(root),
                leaves_found,
            })
        }
    }
}
