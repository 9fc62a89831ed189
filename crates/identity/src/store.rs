//! User storage seam.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use souk_core::UserId;

use crate::user::User;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    /// Email or username already taken.
    #[error("email or username already registered")]
    Duplicate,
}

/// Storage boundary for user records.
///
/// Implementations own durability; the service layer owns the rules.
pub trait UserStore: Send + Sync {
    fn insert(&self, user: User) -> Result<(), UserStoreError>;
    fn get(&self, id: UserId) -> Option<User>;
    fn find_by_username(&self, username: &str) -> Option<User>;
}

/// Mutex-protected map, suitable for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = self.users.lock().unwrap();
        let taken = users
            .values()
            .any(|u| u.email == user.email || u.username == user.username);
        if taken {
            return Err(UserStoreError::Duplicate);
        }
        users.insert(user.id, user);
        Ok(())
    }

    fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned()
    }
}
