//! Credential claims model (transport-agnostic).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use souk_core::SubjectId;

/// The signed payload carried inside a credential.
///
/// Timestamps are unix seconds on the wire; conversion helpers below keep
/// the rest of the codebase in `DateTime<Utc>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject the credential asserts.
    pub sub: String,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiration (unix seconds).
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// A minted credential: the opaque token plus the window it is valid for.
///
/// Immutable once issued; expiry is the only lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCredential {
    /// Opaque signed token. Consumers other than the verifier must not
    /// interpret its contents.
    pub token: String,
    pub subject: SubjectId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
