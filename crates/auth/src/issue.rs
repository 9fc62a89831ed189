//! Credential minting.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use thiserror::Error;

use souk_core::SubjectId;

use crate::claims::{Claims, SignedCredential};
use crate::DEFAULT_TTL_MINUTES;

#[derive(Debug, Error)]
pub enum IssueError {
    /// The subject identifier is empty or malformed.
    #[error("invalid subject")]
    InvalidSubject,

    /// The token codec failed (key/serialization problem, not a caller error).
    #[error("failed to encode credential: {0}")]
    Encoding(String),
}

/// Mints signed, time-bounded credentials.
///
/// Stateless: issuance has no side effects and keeps no record of what was
/// issued. Audit logging, if wanted, belongs to the caller.
pub struct CredentialIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl CredentialIssuer {
    /// Issuer over a process-wide HS256 secret with the default lifetime.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mint a credential for `subject`, valid for the configured window
    /// starting at `issued_at`.
    ///
    /// The caller supplies `issued_at`; this function never reads the wall
    /// clock.
    pub fn issue(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<SignedCredential, IssueError> {
        let subject = SubjectId::parse(subject).map_err(|_| IssueError::InvalidSubject)?;

        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: subject.as_str().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| IssueError::Encoding(e.to_string()))?;

        Ok(SignedCredential {
            token,
            subject,
            issued_at,
            expires_at,
        })
    }
}
