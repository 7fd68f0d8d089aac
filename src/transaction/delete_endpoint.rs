//! Defines the endpoints for deleting transactions.

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
    database_id::{BulkDeleteForm, DeletedRow},
    response::render_data,
    transaction::core::{
        TransactionId, TransactionState, delete_transaction, delete_transactions,
    },
};

/// A route handler for deleting one of the user's transactions.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, DeletedRow { id: transaction_id }))
}

/// A route handler for deleting many transactions, responds with the deleted IDs.
pub async fn bulk_delete_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<BulkDeleteForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let deleted = delete_transactions(&form.ids, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, deleted))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        account::create_account,
        endpoints::{self, format_endpoint},
        name::Name,
        test_utils::get_test_server_with_user,
        transaction::{Transaction, count_transactions, insert_transactions},
    };

    #[tokio::test]
    async fn delete_and_bulk_delete_transactions() {
        let (server, state, user_id, cookie) = get_test_server_with_user();
        let transactions = {
            let connection = state.db_connection.lock().unwrap();
            let account_id = create_account(Name::new_unchecked("Everyday"), user_id, &connection)
                .unwrap()
                .id;
            let day = date!(2025 - 01 - 01);
            insert_transactions(
                vec![
                    Transaction::build(1.0, day, "A", account_id).unwrap(),
                    Transaction::build(2.0, day, "B", account_id).unwrap(),
                    Transaction::build(3.0, day, "C", account_id).unwrap(),
                ],
                user_id,
                &connection,
            )
            .unwrap()
        };

        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, transactions[0].id))
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "data": { "id": transactions[0].id } }));

        let response = server
            .post(endpoints::TRANSACTIONS_BULK_DELETE)
            .add_cookie(cookie.clone())
            .json(&json!({ "ids": [transactions[0].id, transactions[1].id] }))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "data": [{ "id": transactions[1].id }] }));

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, transactions[0].id))
            .add_cookie(cookie)
            .await
            .assert_status_not_found();
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(1));
    }
}
