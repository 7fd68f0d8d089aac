//! Defines the endpoint for logging out the current user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, response::render_data};

/// Invalidate the auth cookie, logging the user out.
pub async fn post_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (jar, render_data(StatusCode::OK, ())).into_response()
}
