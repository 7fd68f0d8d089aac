//! Helpers shared by the tests of multiple modules.

#![allow(missing_docs)]

use std::str::FromStr;

use axum::{
    body::Body,
    http::{Response, header::SET_COOKIE},
    response::IntoResponse,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppState, BillingConfig, UserID,
    auth::{DEFAULT_COOKIE_DURATION, PasswordHash, create_user, set_auth_cookie},
    build_router,
};

pub(crate) const TEST_WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// Billing settings that point at an address nothing listens on.
///
/// Tests that talk to the billing provider should start a stub server and
/// override `api_url`.
pub(crate) fn test_billing_config() -> BillingConfig {
    BillingConfig {
        api_url: "http://127.0.0.1:9".to_owned(),
        api_key: "test_api_key".to_owned(),
        store_id: "1234".to_owned(),
        product_id: "5678".to_owned(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_owned(),
        app_url: "http://localhost:3000".to_owned(),
    }
}

#[track_caller]
pub(crate) fn get_test_state() -> AppState {
    get_test_state_with_billing(test_billing_config())
}

#[track_caller]
pub(crate) fn get_test_state_with_billing(billing_config: BillingConfig) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

    AppState::new(connection, "42", "Etc/UTC", billing_config)
        .expect("Could not create app state")
}

/// Insert a user directly into the database, skipping password hashing.
#[track_caller]
pub(crate) fn create_test_user(state: &AppState, email: &str) -> UserID {
    let connection = state.db_connection.lock().unwrap();

    insert_test_user(&connection, email)
}

#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        &EmailAddress::from_str(email).unwrap(),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
    .id
}

/// Build the encrypted auth cookie a logged in client for `user_id` would send.
#[track_caller]
pub(crate) fn auth_cookie_for(state: &AppState, user_id: UserID) -> Cookie<'static> {
    let jar = PrivateCookieJar::new(state.cookie_key.clone());
    let jar = set_auth_cookie(jar, user_id, DEFAULT_COOKIE_DURATION).unwrap();
    let response = jar.into_response();
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("Missing set-cookie header")
        .to_str()
        .unwrap()
        .to_owned();

    Cookie::parse(header).expect("Could not parse auth cookie")
}

/// A server with every route and a logged in user.
pub(crate) fn get_test_server_with_user() -> (TestServer, AppState, UserID, Cookie<'static>) {
    let state = get_test_state();
    let user_id = create_test_user(&state, "test@test.com");
    let cookie = auth_cookie_for(&state, user_id);
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state, user_id, cookie)
}

pub(crate) async fn response_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not JSON")
}
