//! Defines the endpoints for creating transactions.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::Json,
    auth::UserID,
    response::render_data,
    transaction::{
        core::{TransactionState, create_transaction, insert_transactions},
        form::TransactionForm,
    },
};

/// A route handler for creating a new transaction, responds with 201 and the transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<Response, Error> {
    let builder = form.into_builder()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(builder, user_id, &connection)?;

    Ok(render_data(StatusCode::CREATED, transaction))
}

/// A route handler for creating many transactions at once.
///
/// Either all of the transactions are created or none are.
pub async fn bulk_create_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(forms): Json<Vec<TransactionForm>>,
) -> Result<Response, Error> {
    let builders = forms
        .into_iter()
        .map(TransactionForm::into_builder)
        .collect::<Result<Vec<_>, _>>()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = insert_transactions(builders, user_id, &connection)?;

    Ok(render_data(StatusCode::CREATED, transactions))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        account::create_account,
        endpoints,
        name::Name,
        test_utils::{create_test_user, get_test_server_with_user},
        transaction::count_transactions,
    };

    #[tokio::test]
    async fn create_transaction_returns_submitted_fields() {
        let (server, state, user_id, cookie) = get_test_server_with_user();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Everyday"), user_id, &connection).unwrap()
        };

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie)
            .json(&json!({
                "amount": -45.99,
                "date": "2025-01-15",
                "payee": "Supermarket",
                "notes": "weekly shop",
                "account_id": account.id,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_json(&json!({
            "data": {
                "id": 1,
                "amount": -45.99,
                "date": "2025-01-15",
                "payee": "Supermarket",
                "notes": "weekly shop",
                "account_id": account.id,
                "category_id": null,
            }
        }));
    }

    #[tokio::test]
    async fn create_transaction_with_other_users_account_fails() {
        let (server, state, _, cookie) = get_test_server_with_user();
        let other_user = create_test_user(&state, "other@test.com");
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Theirs"), other_user, &connection).unwrap()
        };

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie)
            .json(&json!({
                "amount": 1.0,
                "date": "2025-01-15",
                "payee": "Someone",
                "account_id": account.id,
            }))
            .await;

        response.assert_status_bad_request();
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[tokio::test]
    async fn create_transaction_with_empty_payee_fails() {
        let (server, state, user_id, cookie) = get_test_server_with_user();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Everyday"), user_id, &connection).unwrap()
        };

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie)
            .json(&json!({
                "amount": 1.0,
                "date": "2025-01-15",
                "payee": "",
                "account_id": account.id,
            }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "payee cannot be empty" }));
    }

    #[tokio::test]
    async fn malformed_body_is_json_error() {
        let (server, _, _, cookie) = get_test_server_with_user();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie)
            .json(&json!({ "amount": "x" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<serde_json::Value>();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn bulk_create_is_all_or_nothing() {
        let (server, state, user_id, cookie) = get_test_server_with_user();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Everyday"), user_id, &connection).unwrap()
        };

        let response = server
            .post(endpoints::TRANSACTIONS_BULK_CREATE)
            .add_cookie(cookie.clone())
            .json(&json!([
                { "amount": 1.0, "date": "2025-01-15", "payee": "A", "account_id": account.id },
                { "amount": 2.0, "date": "2025-01-16", "payee": "B", "account_id": account.id, "category_id": 99 },
            ]))
            .await;

        response.assert_status_bad_request();
        {
            let connection = state.db_connection.lock().unwrap();
            assert_eq!(count_transactions(&connection), Ok(0));
        }

        let response = server
            .post(endpoints::TRANSACTIONS_BULK_CREATE)
            .add_cookie(cookie)
            .json(&json!([
                { "amount": 1.0, "date": "2025-01-15", "payee": "A", "account_id": account.id },
                { "amount": 2.0, "date": "2025-01-16", "payee": "B", "account_id": account.id },
            ]))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(2));
    }
}
