//! `souk-identity` — the identity service core.
//!
//! Owns user records exclusively: other services only ever see the subject
//! identifier extracted from a verified credential, never the record itself.
//! Password hashing is a peripheral collaborator behind the
//! [`PasswordHasher`] seam.

pub mod service;
pub mod store;
pub mod user;

pub use service::{IdentityError, IdentityService, PasswordHasher};
pub use store::{InMemoryUserStore, UserStore, UserStoreError};
pub use user::{NewUser, User, UserProfile};
