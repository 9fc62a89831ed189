//! `souk-auth` — stateless credential issuance and verification.
//!
//! A credential is a signed, time-bounded proof of identity that every souk
//! service can check on its own: there is no session store and no network
//! call on the verification path. The issuer and verifier share nothing but
//! key material and a clock passed in by the caller.

pub mod claims;
pub mod issue;
pub mod verify;

pub use claims::{Claims, SignedCredential};
pub use issue::{CredentialIssuer, IssueError};
pub use verify::{CredentialVerifier, VerifyError};

/// Default credential lifetime.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Default clock-skew tolerance applied at verification.
pub const DEFAULT_SKEW_SECONDS: i64 = 60;
