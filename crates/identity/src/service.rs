//! Registration, login, and credential-backed lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use souk_auth::{CredentialIssuer, CredentialVerifier, SignedCredential};
use souk_core::UserId;

use crate::store::{UserStore, UserStoreError};
use crate::user::{NewUser, User, UserProfile};

/// Password hashing seam (peripheral collaborator).
///
/// The core never embeds a hash algorithm; deployments inject one.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Generic authentication failure. Deliberately does not distinguish
    /// unknown user, wrong password, or bad/expired credential: nothing
    /// here may leak whether a username exists.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email or username already registered")]
    AlreadyRegistered,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("credential issuance failed")]
    Issuance,
}

pub struct IdentityService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: CredentialIssuer,
    verifier: CredentialVerifier,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: CredentialIssuer,
        verifier: CredentialVerifier,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
            verifier,
        }
    }

    /// Register a new user. Email and username must be unused.
    pub fn register(&self, new: NewUser, now: DateTime<Utc>) -> Result<UserProfile, IdentityError> {
        validate_registration(&new)?;

        let user = User {
            id: UserId::new(),
            email: new.email,
            username: new.username,
            full_name: new.full_name,
            password_hash: self.hasher.hash(&new.password),
            created_at: now,
        };
        let profile = UserProfile::from(&user);

        self.store.insert(user).map_err(|e| match e {
            UserStoreError::Duplicate => IdentityError::AlreadyRegistered,
        })?;

        tracing::info!(user_id = %profile.id, "user registered");
        Ok(profile)
    }

    /// Verify login material and mint a credential for the user's subject.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedCredential, IdentityError> {
        let user = self
            .store
            .find_by_username(username)
            .ok_or(IdentityError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }

        self.issuer
            .issue(&user.id.to_string(), now)
            .map_err(|_| IdentityError::Issuance)
    }

    /// Resolve a presented credential back to the user record it asserts.
    ///
    /// Any verification failure collapses to [`IdentityError::InvalidCredentials`].
    pub fn whoami(&self, token: &str, now: DateTime<Utc>) -> Result<UserProfile, IdentityError> {
        let subject = self
            .verifier
            .verify(token, now)
            .map_err(|_| IdentityError::InvalidCredentials)?;

        let user_id: UserId = subject
            .as_str()
            .parse()
            .map_err(|_| IdentityError::InvalidCredentials)?;

        self.store
            .get(user_id)
            .map(|u| UserProfile::from(&u))
            .ok_or(IdentityError::InvalidCredentials)
    }
}

fn validate_registration(new: &NewUser) -> Result<(), IdentityError> {
    if new.username.trim().is_empty() || new.username.contains(char::is_whitespace) {
        return Err(IdentityError::Validation(
            "username must be non-empty without whitespace".into(),
        ));
    }
    if !new.email.contains('@') {
        return Err(IdentityError::Validation("email is not valid".into()));
    }
    if new.password.is_empty() {
        return Err(IdentityError::Validation("password must not be empty".into()));
    }
    Ok(())
}
