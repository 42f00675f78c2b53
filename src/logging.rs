//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged at the `debug` level.
///
/// The `password` field of JSON request bodies is redacted before anything
/// is written to the log.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = extract_parts_and_body_text_from_request(request).await;

    if parts.method == axum::http::Method::POST && is_json(&parts.headers) {
        let display_text = redact_field(&body_text, "password");
        log_request(&parts, &display_text);
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = extract_parts_and_body_text_from_response(response).await;
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"))
}

/// Replace the value of `field_name` in a JSON object with asterisks.
///
/// Bodies that do not parse as a JSON object are returned unchanged.
fn redact_field(body_text: &str, field_name: &str) -> String {
    let mut value: serde_json::Value = match serde_json::from_str(body_text) {
        Ok(value) => value,
        Err(_) => return body_text.to_string(),
    };

    if let Some(object) = value.as_object_mut() {
        if object.contains_key(field_name) {
            object.insert(
                field_name.to_string(),
                serde_json::Value::String("********".to_string()),
            );
        }
        return value.to_string();
    }

    body_text.to_string()
}

async fn extract_parts_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_parts_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {parts:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {parts:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {parts:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redact_tests {
    use serde_json::{Value, json};

    use super::redact_field;

    #[test]
    fn redacts_password_field() {
        let body = json!({
            "email": "asha@x.com",
            "password": "pw123",
        })
        .to_string();

        let redacted = redact_field(&body, "password");

        assert!(!redacted.contains("pw123"));
        let value: Value = serde_json::from_str(&redacted).unwrap();
        assert_eq!(value["password"], "********");
        assert_eq!(value["email"], "asha@x.com");
    }

    #[test]
    fn leaves_bodies_without_the_field_unchanged() {
        let body = json!({ "email": "asha@x.com" }).to_string();

        let redacted = redact_field(&body, "password");

        let value: Value = serde_json::from_str(&redacted).unwrap();
        assert_eq!(value["email"], "asha@x.com");
        assert!(value.get("password").is_none());
    }

    #[test]
    fn leaves_non_json_bodies_unchanged() {
        let body = "password=pw123";

        assert_eq!(redact_field(body, "password"), body);
    }
}
