//! Stateless credential verification.
//!
//! `verify` is pure: identical (token, now) inputs always produce identical
//! results, so every service can run its own verifier without coordination.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use souk_core::SubjectId;

use crate::claims::Claims;
use crate::DEFAULT_SKEW_SECONDS;

/// Why a presented credential was rejected.
///
/// Callers exposed to untrusted clients should collapse all three kinds into
/// one generic unauthenticated outcome; the distinction exists for logs and
/// tests, not for responses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The token is structurally not a credential.
    #[error("malformed credential")]
    Malformed,

    /// The signature does not verify against the issuer key.
    #[error("bad credential signature")]
    BadSignature,

    /// The credential's validity window has passed.
    #[error("credential expired")]
    Expired,
}

/// Checks presented credentials against the issuer key.
pub struct CredentialVerifier {
    key: DecodingKey,
    skew: Duration,
    validation: Validation,
}

impl CredentialVerifier {
    /// Verifier over the issuer's HS256 secret with the default skew
    /// tolerance.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_skew(secret, Duration::seconds(DEFAULT_SKEW_SECONDS))
    }

    pub fn with_skew(secret: &[u8], skew: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock; the library's
        // own wall-clock check would make `verify` impure.
        validation.validate_exp = false;
        Self {
            key: DecodingKey::from_secret(secret),
            skew,
            validation,
        }
    }

    /// Verify `token` as of `now` and extract the subject it asserts.
    ///
    /// Checks short-circuit in a fixed order: structure, signature, expiry,
    /// subject extraction. No IO, no shared state.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SubjectId, VerifyError> {
        // Structural check first: three non-empty dot-separated segments.
        let mut segments = token.split('.');
        let structurally_ok = segments.by_ref().take(3).filter(|s| !s.is_empty()).count() == 3
            && segments.next().is_none();
        if !structurally_ok {
            return Err(VerifyError::Malformed);
        }

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::BadSignature,
                _ => VerifyError::Malformed,
            }
        })?;
        let claims = data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(VerifyError::Malformed)?;
        if expires_at + self.skew <= now {
            return Err(VerifyError::Expired);
        }

        SubjectId::parse(claims.sub).map_err(|_| VerifyError::Malformed)
    }
}
