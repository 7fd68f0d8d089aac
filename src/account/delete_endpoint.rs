//! Defines the endpoints for deleting accounts.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::{Json, Path},
    account::core::{AccountId, AccountState, delete_account, delete_accounts},
    auth::UserID,
    database_id::{BulkDeleteForm, DeletedRow},
    response::render_data,
};

/// A route handler for deleting one of the logged in user's accounts.
///
/// The account's transactions are deleted with it.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_account(account_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, DeletedRow { id: account_id }))
}

/// A route handler for deleting many of the logged in user's accounts.
///
/// Responds with the IDs of the accounts that were actually deleted.
pub async fn bulk_delete_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<BulkDeleteForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let deleted = delete_accounts(&form.ids, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, deleted))
}
