//! The fallback response for unknown routes and missing resources.

use axum::{http::StatusCode, response::Response};

use crate::response::render_error;

/// Route handler for requests that do not match any route.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// A JSON 404 response.
pub fn get_404_not_found_response() -> Response {
    render_error(StatusCode::NOT_FOUND, "Not found")
}
