//! Traits at the seams with the external collaborators: time-stamp authority verification and
//! format parsing.
use crate::errors::Error;
use crate::model::{EvidenceRecord, EvidenceRecordType, IncorporationType, TimeStampToken};
use chrono::{DateTime, Utc};

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Result of the cryptographic verification of a time-stamp token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct TokenValidation {
    /// The token signature verifies against the signer key.
    pub signature_intact: bool,
    /// The signature is intact and was produced by a trusted source.
    pub signature_valid: bool,
    /// The generation time, once the token is trusted.
    pub trusted_time: Option<DateTime<Utc>>,
}

/// Trait that defines a time-stamp authority verifier.
///
/// # Example
/// ```
/// use evidence_record_verify::errors::Error;
/// use evidence_record_verify::model::TimeStampToken;
/// use evidence_record_verify::traits::{TokenValidation, TsaVerifier};
///
/// struct TrustEverything;
///
/// impl TsaVerifier for TrustEverything {
///     fn verify(&self, token: &TimeStampToken) -> Result<TokenValidation, Error> {
///         Ok(TokenValidation {
///             signature_intact: true,
///             signature_valid: true,
///             trusted_time: token.gen_time(),
///         })
///     }
/// }
/// ```
pub trait TsaVerifier: Send + Sync {
    /// Verify the signature of `token`, and whether it comes from a trusted source.
    ///
    /// # Errors
    /// Implementations return `Error::UnsupportedAlgorithm` for signature algorithms they cannot
    /// evaluate. A signature that does not verify is not an error.
    fn verify(&self, token: &TimeStampToken) -> Result<TokenValidation, Error>;
}

impl<T: TsaVerifier + ?Sized> TsaVerifier for &T {
    fn verify(&self, token: &TimeStampToken) -> Result<TokenValidation, Error> {
        (**self).verify(token)
    }
}

/// Trait that defines an evidence record parser for one serialization family.
///
/// Parsers requiring process-wide setup (XML namespace registration) take it in their
/// constructor.
pub trait EvidenceRecordParser {
    /// Serialization family handled by the parser.
    fn record_type(&self) -> EvidenceRecordType;
    /// Cheap check whether `bytes` can be parsed.
    fn is_supported(&self, bytes: &[u8]) -> bool;
    /// Build the object model. Structural well-formedness is checked here.
    fn parse(
        &self,
        bytes: &[u8],
        incorporation: IncorporationType,
    ) -> Result<EvidenceRecord, Error>;
}
