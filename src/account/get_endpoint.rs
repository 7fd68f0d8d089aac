//! Defines the endpoints for listing accounts and fetching a single account.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::Path,
    account::core::{AccountId, AccountState, get_account, get_accounts},
    auth::UserID,
    response::render_data,
};

/// A route handler that lists the logged in user's accounts ordered by ID.
pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(user_id, &connection)?;

    Ok(render_data(StatusCode::OK, accounts))
}

/// A route handler that fetches one of the logged in user's accounts.
pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, account))
}
