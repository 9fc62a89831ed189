//! Strongly-typed identifiers used across the services.
//!
//! Cross-service references are identifiers only: an `OrderId` held by the
//! order service says nothing about whether the identity or catalog service
//! can still resolve the records it points at.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a user record (owned by the identity service).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Identifier of a product (owned by the catalog service).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

/// Identifier of an order (owned by the order service).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(UserId, "UserId");
impl_uuid_newtype!(ProductId, "ProductId");
impl_uuid_newtype!(OrderId, "OrderId");

/// The identity a credential asserts.
///
/// Subjects are opaque to every consumer except the identity service that
/// minted them: downstream services compare and store them, nothing more.
/// The only structure imposed here is what safe transport requires:
/// non-empty, bounded, printable ASCII with no whitespace, so a subject is
/// always valid as an HTTP header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap a raw subject string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::validation("subject must not be empty"));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(DomainError::validation("subject too long"));
        }
        if !raw.chars().all(|c| c.is_ascii_graphic()) {
            return Err(DomainError::validation(
                "subject must be printable ASCII without whitespace",
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for SubjectId {
    fn from(value: UserId) -> Self {
        // Uuid display form is always a valid subject.
        Self(value.to_string())
    }
}

impl FromStr for SubjectId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_accepts_plain_identifiers() {
        assert!(SubjectId::parse("u1").is_ok());
        assert!(SubjectId::parse(UserId::new().to_string()).is_ok());
    }

    #[test]
    fn subject_rejects_empty_and_whitespace() {
        assert!(SubjectId::parse("").is_err());
        assert!(SubjectId::parse("u 1").is_err());
        assert!(SubjectId::parse("u\n1").is_err());
        assert!(SubjectId::parse("ü1").is_err());
    }

    #[test]
    fn subject_rejects_oversized_input() {
        let raw = "x".repeat(SubjectId::MAX_LEN + 1);
        assert!(SubjectId::parse(raw).is_err());
    }

    #[test]
    fn order_id_round_trips_through_string() {
        let id = OrderId::new();
        let parsed: OrderId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
