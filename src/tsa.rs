//! Reference time-stamp authority verifier for tokens signed with Ed25519.
//!
//! The token carries the public key of its time-stamping unit. The signature is intact when it
//! verifies with that key over the signed content; it is valid when, in addition, the key is
//! one of the trusted keys of the verifier.
use crate::errors::Error;
use crate::model::TimeStampToken;
use crate::traits::{TokenValidation, TsaVerifier};
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH};
use std::collections::BTreeSet;
use tracing::debug;

/// Object identifier of Ed25519 (RFC 8410).
pub const ED25519_OID: &str = "1.3.101.112";

/// Time-stamp authority verifier checking Ed25519 token signatures against a trusted key set.
#[derive(Debug, Clone, Default)]
pub struct Ed25519TsaVerifier {
    trusted: BTreeSet<[u8; PUBLIC_KEY_LENGTH]>,
}

impl Ed25519TsaVerifier {
    /// A verifier trusting no key. Signatures can be intact, never valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `key`.
    pub fn trust(mut self, key: &VerifyingKey) -> Self {
        self.trusted.insert(key.to_bytes());
        self
    }

    /// Trust a key given by its encoding.
    ///
    /// # Errors
    /// `Error::InvalidKeySize` if `bytes` is not 32 bytes long, or a signature error if it is
    /// not a valid point.
    pub fn trust_bytes(self, bytes: &[u8]) -> Result<Self, Error> {
        let key = verifying_key(bytes)?;
        Ok(self.trust(&key))
    }

    /// `key` is trusted.
    pub fn is_trusted(&self, key: &VerifyingKey) -> bool {
        self.trusted.contains(&key.to_bytes())
    }
}

fn verifying_key(bytes: &[u8]) -> Result<VerifyingKey, Error> {
    let bytes: &[u8; PUBLIC_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| Error::InvalidKeySize(bytes.len()))?;
    Ok(VerifyingKey::from_bytes(bytes)?)
}

fn is_ed25519(identifier: &str) -> bool {
    let identifier = identifier.trim();
    identifier == ED25519_OID || identifier.eq_ignore_ascii_case("ed25519")
}

impl TsaVerifier for Ed25519TsaVerifier {
    fn verify(&self, token: &TimeStampToken) -> Result<TokenValidation, Error> {
        let signer = match token.signer_info() {
            Some(signer) => signer,
            None => {
                debug!("time-stamp token carries no signer information");
                return Ok(TokenValidation::default());
            }
        };
        if !is_ed25519(&signer.algorithm) {
            return Err(Error::UnsupportedAlgorithm(signer.algorithm.clone()));
        }

        let key = verifying_key(&signer.public_key)?;
        let signature = Signature::from_slice(&signer.signature)?;
        let signature_intact = key
            .verify_strict(&signer.signed_content, &signature)
            .is_ok();
        let signature_valid = signature_intact && self.is_trusted(&key);

        Ok(TokenValidation {
            signature_intact,
            signature_valid,
            trusted_time: if signature_valid {
                token.gen_time()
            } else {
                None
            },
        })
    }
}
