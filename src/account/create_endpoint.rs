//! Defines the endpoint for creating a new account.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::Json,
    account::core::{AccountState, create_account},
    auth::UserID,
    name::{Name, NameForm},
    response::render_data,
};

/// A route handler for creating a new account owned by the logged in user.
///
/// Responds with 201 and the new account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NameForm>,
) -> Result<Response, Error> {
    let name = Name::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let account = create_account(name, user_id, &connection)?;

    Ok(render_data(StatusCode::CREATED, account))
}
