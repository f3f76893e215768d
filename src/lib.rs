//! Verification of Evidence Records.
//!
//! "Evidence Record Syntax (ERS)", RFC 4998 <https://www.rfc-editor.org/rfc/rfc4998>
//! "XML Evidence Record Syntax (XMLERS)", RFC 6283 <https://www.rfc-editor.org/rfc/rfc6283>
//!
//! An evidence record proves that a set of objects existed at a point in time and has not been
//! modified since. It is a sequence of archive time-stamp chains; every archive time-stamp
//! carries a reduced hash tree whose root is attested by a time-stamp token. The engine
//! recomputes every root, checks that the covered objects are leaves of the trees, and that
//! each time-stamp renews its predecessor, and reports one verdict per time-stamp.
//!
//! ```
//! use evidence_record_verify::covered::CoveredObjectSet;
//! use evidence_record_verify::digest::{digest, DigestAlgorithm};
//! use evidence_record_verify::errors::Error;
//! use evidence_record_verify::model::*;
//! use evidence_record_verify::traits::{TokenValidation, TsaVerifier};
//! use evidence_record_verify::validator::validate;
//!
//! struct TrustEverything;
//!
//! impl TsaVerifier for TrustEverything {
//!     fn verify(&self, token: &TimeStampToken) -> Result<TokenValidation, Error> {
//!         Ok(TokenValidation {
//!             signature_intact: true,
//!             signature_valid: true,
//!             trusted_time: token.gen_time(),
//!         })
//!     }
//! }
//!
//! let signature = b"signature value";
//! let token = TimeStampToken::new(
//!     b"token".to_vec(),
//!     MessageImprint {
//!         algorithm: "SHA-256".to_owned(),
//!         digest: digest(DigestAlgorithm::Sha256, signature),
//!     },
//! );
//! let record = EvidenceRecord::new(
//!     EvidenceRecordType::Asn1,
//!     IncorporationType::Internal,
//!     vec![ArchiveTimeStampChain::new(
//!         "2.16.840.1.101.3.4.2.1",
//!         vec![ArchiveTimeStamp::new(None, token)],
//!     )],
//! )
//! .with_references(vec![CoveredReference::new(CoveredCategory::Signature, "sig")]);
//! let covered = CoveredObjectSet::new().with_bytes(CoveredCategory::Signature, "sig", signature);
//!
//! let verdict = validate(&record, &covered, TrustEverything)?;
//! assert!(verdict.overall_intact);
//! # Ok::<(), Error>(())
//! ```
#![warn(missing_docs, rust_2018_idioms)]

pub mod archive_timestamp;
pub mod chain;
pub mod common;
pub mod covered;
pub mod digest;
pub mod errors;
pub mod format;
pub mod hash_tree;
pub mod model;
pub mod traits;
pub mod tsa;
pub mod validator;
pub mod verdict;

pub use errors::Error;
pub use validator::{validate, Validator, VerifyConfig};
pub use verdict::{EvidenceRecordVerdict, Indication, SubIndication, TimestampVerdict};
