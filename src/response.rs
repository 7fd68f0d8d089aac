//! Helpers for building the JSON bodies returned by the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The envelope for successful responses, serialized as `{"data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBody<T> {
    /// The payload of the response.
    pub data: T,
}

/// The envelope for error responses, serialized as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A message describing what went wrong.
    pub error: String,
}

#[inline]
pub fn render_data<T: Serialize>(status_code: StatusCode, data: T) -> Response {
    (status_code, Json(DataBody { data })).into_response()
}

#[inline]
pub fn render_error(status_code: StatusCode, message: &str) -> Response {
    (
        status_code,
        Json(ErrorBody {
            error: message.to_owned(),
        }),
    )
        .into_response()
}
