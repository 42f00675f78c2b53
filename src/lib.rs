//! The account-credential backend for the AgriSetu platform.
//!
//! This library provides a small JSON REST API with two operations:
//! registering a new account and logging in against it. Accounts live in a
//! SQLite database with a unique email per account, and passwords are only
//! ever stored as bcrypt hashes.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod db;
mod endpoints;
mod log_in;
mod logging;
mod models;
mod register;
mod routing;
mod stores;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use models::{PasswordHash, User, UserID, UserProfile, ValidatedPassword};
pub use routing::build_router;
pub use stores::{SQLiteUserStore, UserStore};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or empty. The client should fill in the
    /// field and resubmit the request.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The submitted email address could not be parsed.
    #[error("invalid email address")]
    InvalidEmail,

    /// The email used to create an account is already in use. The client
    /// should try again with a different email address.
    #[error("the email is already in use")]
    EmailTaken,

    /// The user provided an invalid combination of email and password.
    ///
    /// This error intentionally does not say which of the two was wrong so
    /// that clients cannot probe which emails are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested record was not found.
    ///
    /// Internally, this error may occur when a query returns no rows. It
    /// should never reach a client unmapped.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The database could not be reached within the configured deadline.
    ///
    /// The caller may retry the request after backing off.
    #[error("the database is unavailable")]
    Unavailable,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::EmailTaken
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy
                    || sql_error.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Error::Unavailable
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            Error::EmptyField(_) | Error::InvalidEmail => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            Error::EmailTaken => (StatusCode::CONFLICT, "email_taken"),
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            Error::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "connection_unavailable"),
            Error::HashingError(_) | Error::NotFound | Error::SqlError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match self {
            // Driver and hashing detail stays in the server logs.
            Error::HashingError(_) | Error::NotFound | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
                "an internal error occurred, please try again later".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "kind": kind, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::{Connection, ffi};

    use super::Error;

    #[test]
    fn unique_email_constraint_maps_to_email_taken() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE user (email TEXT UNIQUE NOT NULL)", ())
            .unwrap();
        conn.execute("INSERT INTO user (email) VALUES ('foo@bar.baz')", ())
            .unwrap();

        let error: Error = conn
            .execute("INSERT INTO user (email) VALUES ('foo@bar.baz')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::EmailTaken);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn busy_database_maps_to_unavailable() {
        let sql_error = ffi::Error::new(ffi::SQLITE_BUSY);

        let error: Error = rusqlite::Error::SqliteFailure(sql_error, None).into();

        assert_eq!(error, Error::Unavailable);
    }

    #[test]
    fn error_statuses_match_their_kind() {
        let cases = [
            (Error::EmptyField("password"), StatusCode::BAD_REQUEST),
            (Error::InvalidEmail, StatusCode::BAD_REQUEST),
            (Error::EmailTaken, StatusCode::CONFLICT),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                Error::HashingError("oops".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, want) in cases {
            let got = error.into_response().status();
            assert_eq!(got, want, "want status {want}, got {got}");
        }
    }
}
