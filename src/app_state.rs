//! Implements a struct that holds the state of the REST server.

use std::marker::{Send, Sync};

use crate::{models::PasswordHash, stores::UserStore};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<U>
where
    U: UserStore + Send + Sync,
{
    /// The store for managing application [users](crate::models::User).
    pub user_store: U,
    /// The bcrypt cost used when hashing new passwords.
    ///
    /// Fixed at [PasswordHash::DEFAULT_COST] in production; tests lower it to
    /// keep hashing fast.
    pub hash_cost: u32,
}

impl<U> AppState<U>
where
    U: UserStore + Send + Sync,
{
    /// Create a new [AppState].
    pub fn new(user_store: U) -> Self {
        Self {
            user_store,
            hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}
