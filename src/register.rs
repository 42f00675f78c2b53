//! The route handler for registering a new account.

use std::str::FromStr;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    models::{PasswordHash, ValidatedPassword},
    stores::UserStore,
};

/// The raw data submitted when registering a new account.
///
/// Each field defaults to the empty string so that an absent field takes the
/// same validation path as an empty one.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The display name for the new account.
    #[serde(default)]
    pub name: String,
    /// The email address for the new account.
    #[serde(default)]
    pub email: String,
    /// The plaintext password for the new account.
    #[serde(default)]
    pub password: String,
}

/// Handler for registration requests via the POST method.
///
/// The store's unique email index is the authoritative duplicate check; the
/// existence query before hashing only exists to make the common duplicate
/// case cheap. Both paths produce the same [Error::EmailTaken] response.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - A field was missing or empty, or the email could not be parsed.
/// - The email already belongs to a registered user.
/// - The store could not be reached.
pub async fn register_user<U>(
    State(mut state): State<AppState<U>>,
    Json(data): Json<RegisterData>,
) -> Result<Response, Error>
where
    U: UserStore + Clone + Send + Sync,
{
    if data.name.trim().is_empty() {
        return Err(Error::EmptyField("name"));
    }

    if data.email.is_empty() {
        return Err(Error::EmptyField("email"));
    }

    let password = ValidatedPassword::new(&data.password)?;

    let email = EmailAddress::from_str(&data.email).map_err(|_| Error::InvalidEmail)?;

    tracing::info!("Incoming registration for {}", email);

    match state.user_store.get_by_email(&email) {
        Ok(_) => return Err(Error::EmailTaken),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let password_hash = PasswordHash::new(password, state.hash_cost)?;

    let user = state.user_store.create(data.name, email, password_hash)?;

    tracing::info!("Registered account for {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    )
        .into_response())
}
