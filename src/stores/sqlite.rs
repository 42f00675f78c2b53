//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
    stores::UserStore,
};

/// Handles the creation and retrieval of User objects.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// The UNIQUE index on the email column is the authoritative uniqueness
    /// gate: two racing inserts for the same email will see exactly one
    /// succeed, with the loser receiving [Error::EmailTaken].
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::EmailTaken] if the given email address is already in use,
    /// - [Error::Unavailable] if the connection lock is poisoned or the
    ///   database stayed busy past its timeout,
    /// - [Error::SqlError] if there was an unexpected SQL error.
    fn create(
        &mut self,
        name: String,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error> {
        let connection = self.connection.lock().map_err(|_| Error::Unavailable)?;

        connection.execute(
            "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)",
            (&name, &email.to_string(), password_hash.as_ref()),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User::new(id, name, email, password_hash))
    }

    /// Get the user from the database that has the specified `email` address, or return [Error::NotFound] if such user does not exist.
    ///
    /// Emails are compared exactly as submitted (SQLite's default BINARY
    /// collation), so lookups are case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns a [Error::NotFound] error if there is no user with the specified email, [Error::Unavailable] if the connection lock is poisoned, or [Error::SqlError] if there are SQL related errors.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::Unavailable)?
            .prepare("SELECT id, name, email, password FROM user WHERE email = :email")?
            .query_row(&[(":email", &email.to_string())], |row| {
                let raw_id = row.get(0)?;
                let name: String = row.get(1)?;
                let raw_email: String = row.get(2)?;
                let raw_password_hash: String = row.get(3)?;

                Ok(User::new(
                    UserID::new(raw_id),
                    name,
                    EmailAddress::new_unchecked(raw_email),
                    PasswordHash::new_unchecked(&raw_password_hash),
                ))
            })
            .map_err(|e| e.into())
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}
