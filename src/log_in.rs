//! The route handler for logging in against a registered account.

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

use crate::{AppState, Error, stores::UserStore};

/// The raw data entered by the user when logging in.
///
/// The email and password are taken as plain strings: they are compared
/// against the records in the database, so there is nothing to validate up
/// front. Each field defaults to the empty string so that an absent field
/// fails the same way as a wrong one.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    #[serde(default)]
    pub email: String,
    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On success the response carries the user's non-secret profile; no session
/// or token is minted, establishing a session is the caller's concern.
///
/// An unknown email, an unparseable email, and a wrong password all produce
/// byte-identical [Error::InvalidCredentials] responses so that clients
/// cannot probe which emails are registered.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in<U>(
    State(state): State<AppState<U>>,
    Json(data): Json<LogInData>,
) -> Result<Response, Error>
where
    U: UserStore + Clone + Send + Sync,
{
    tracing::info!("Log-in attempt for {}", data.email);

    let email = match EmailAddress::from_str(&data.email) {
        Ok(email) => email,
        // An unparseable email cannot belong to any account.
        Err(_) => return Err(Error::InvalidCredentials),
    };

    let user = match state.user_store.get_by_email(&email) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    let is_password_valid = user
        .password_hash
        .verify(&data.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    tracing::info!("Successful log-in for {}", user.email);

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "user": user.profile(),
        })),
    )
        .into_response())
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        db::initialize,
        endpoints,
        models::PasswordHash,
        stores::{SQLiteUserStore, UserStore},
    };

    use super::post_log_in;

    fn get_test_server_with_user(email: &str, password: &str) -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let mut store = SQLiteUserStore::new(Arc::new(Mutex::new(connection)));
        store
            .create(
                "Asha".to_string(),
                email.parse().expect("Could not parse test email"),
                PasswordHash::from_raw_password(password, 4)
                    .expect("Could not hash test password"),
            )
            .expect("Could not create test user");

        let state = AppState {
            user_store: store,
            hash_cost: 4,
        };

        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in::<SQLiteUserStore>))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server_with_user("asha@x.com", "pw123");

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "asha@x.com",
                "password": "pw123",
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["name"], "Asha");
        assert_eq!(body["user"]["email"], "asha@x.com");
        assert!(body["user"]["id"].as_i64().is_some_and(|id| id > 0));
    }

    #[tokio::test]
    async fn log_in_response_contains_no_secret_fields() {
        let server = get_test_server_with_user("asha@x.com", "pw123");

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "asha@x.com",
                "password": "pw123",
            }))
            .await;

        response.assert_status(StatusCode::OK);
        let text = response.text();
        assert!(
            !text.contains("pw123") && !text.contains("password"),
            "response should not contain the password or its hash, got {text}"
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let server = get_test_server_with_user("asha@x.com", "pw123");

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "asha@x.com",
                "password": "wrongpassword",
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["kind"], "invalid_credentials");
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server_with_user("asha@x.com", "pw123");

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "nobody@x.com",
                "password": "pw123",
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["kind"], "invalid_credentials");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let server = get_test_server_with_user("asha@x.com", "pw123");

        let unknown_email = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "nobody@x.com",
                "password": "anything",
            }))
            .await;
        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "asha@x.com",
                "password": "wrongpassword",
            }))
            .await;

        assert_eq!(unknown_email.status_code(), wrong_password.status_code());
        assert_eq!(unknown_email.text(), wrong_password.text());
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server_with_user("asha@x.com", "pw123");

        let response = server.post(endpoints::LOG_IN).json(&json!({})).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["kind"], "invalid_credentials");
    }
}
