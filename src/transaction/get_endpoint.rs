//! Defines the endpoints for listing transactions and fetching a single transaction.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::{Path, Query},
    auth::UserID,
    response::render_data,
    timezone::get_local_date,
    transaction::{
        core::{TransactionId, TransactionState, get_transaction, get_transactions},
        range::PeriodQuery,
    },
};

/// A route handler that lists the user's transactions in a period.
///
/// The period defaults to the last 30 days ending today in the server's local timezone.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;
    let range = query.date_range(today)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions(range, query.account_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, transactions))
}

/// A route handler that fetches one of the user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, transaction))
}
