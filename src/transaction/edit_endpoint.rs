//! Defines the endpoint for updating a transaction.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::{Json, Path},
    auth::UserID,
    response::render_data,
    transaction::{
        core::{TransactionId, TransactionState, get_transaction, update_transaction},
        form::TransactionPatch,
    },
};

/// A route handler for updating some of the fields of one of the user's transactions.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(patch): Json<TransactionPatch>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let existing = get_transaction(transaction_id, user_id, &connection)?;
    let builder = patch.apply(existing)?;
    let transaction = update_transaction(transaction_id, builder, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, transaction))
}
