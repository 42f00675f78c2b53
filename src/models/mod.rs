//! The domain types for the application: users and their passwords.

mod password;
mod user;

pub use password::{PasswordHash, ValidatedPassword};
pub use user::{User, UserID, UserProfile};
