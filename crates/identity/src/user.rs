//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::UserId;

/// A user record, owned exclusively by the identity service.
///
/// Email and username are unique within the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration input (plaintext password; hashed before storage).
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password: String,
}

/// The externally visible view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at,
        }
    }
}
