//! Defines the user store trait that the route handlers are generic over.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, User},
};

/// Handles the creation and retrieval of [User] objects.
///
/// The store is the single source of truth for which emails exist: callers
/// may use [UserStore::get_by_email] as a cheap existence check, but only
/// [UserStore::create] decides whether an email is unique.
pub trait UserStore {
    /// Create a new user.
    ///
    /// Returns [Error::EmailTaken] if a user with `email` already exists,
    /// regardless of any earlier existence check by the caller.
    fn create(
        &mut self,
        name: String,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error>;

    /// Get a user by their email.
    ///
    /// Returns [Error::NotFound] if no user with the given email exists.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;
}
