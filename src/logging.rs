//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{response::render_error, routing::IMPORT_BODY_LIMIT};

/// Bodies longer than this many bytes are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Password fields in JSON and form bodies are redacted. The request is
/// passed on with its original bytes.
///
/// Request bodies larger than [IMPORT_BODY_LIMIT] bytes are rejected with
/// `413 Payload Too Large` without being read in full.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, IMPORT_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return render_error(StatusCode::PAYLOAD_TOO_LARGE, "request body is too large");
        }
    };

    let display_text = redact_body(&parts.headers, &body_bytes);
    tracing::info!(
        "Received request: {parts:#?}\nbody: {}",
        truncate(&display_text)
    );
    if display_text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full request body: {display_text:?}");
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let display_text = String::from_utf8_lossy(&body_bytes);
    tracing::info!(
        "Sending response: {parts:#?}\nbody: {}",
        truncate(&display_text)
    );
    if display_text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full response body: {display_text:?}");
    }

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The body as text with the values of password fields replaced.
fn redact_body(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json")
        && let Ok(mut json) = serde_json::from_slice::<Value>(body)
    {
        redact_json(&mut json);
        return json.to_string();
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return redact_form(&String::from_utf8_lossy(body));
    }

    String::from_utf8_lossy(body).into_owned()
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_json(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_json),
        _ => {}
    }
}

fn redact_form(form_text: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if REDACTED_FIELDS.contains(&key) => format!("{key}={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// At most [LOG_BODY_LENGTH_LIMIT] bytes of `text`, cut on a character boundary.
fn truncate(text: &str) -> String {
    if text.len() <= LOG_BODY_LENGTH_LIMIT {
        return format!("{text:?}");
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{:?}...", &text[..end])
}
