//! Defines the endpoint for renaming an account.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    Error,
    extract::{Json, Path},
    account::core::{AccountId, AccountState, update_account},
    auth::UserID,
    name::{Name, NameForm},
    response::render_data,
};

/// A route handler for renaming one of the logged in user's accounts.
pub async fn edit_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<NameForm>,
) -> Result<Response, Error> {
    let name = Name::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let account = update_account(account_id, name, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, account))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        account::{create_account, get_account},
        endpoints::{self, format_endpoint},
        name::Name,
        test_utils::{create_test_user, get_test_server_with_user},
    };

    #[tokio::test]
    async fn edit_account_renames_account() {
        let (server, state, user_id, cookie) = get_test_server_with_user();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Old"), user_id, &connection).unwrap()
        };

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_cookie(cookie)
            .json(&json!({ "name": "New" }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "data": { "id": account.id, "name": "New" } }));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_account(account.id, user_id, &connection).unwrap().name,
            Name::new_unchecked("New")
        );
    }

    #[tokio::test]
    async fn edit_account_of_other_user_is_not_found() {
        let (server, state, _, cookie) = get_test_server_with_user();
        let other_user = create_test_user(&state, "other@test.com");
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Theirs"), other_user, &connection).unwrap()
        };

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_cookie(cookie)
            .json(&json!({ "name": "Mine now" }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn edit_account_with_empty_name_fails() {
        let (server, state, user_id, cookie) = get_test_server_with_user();
        let account = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Old"), user_id, &connection).unwrap()
        };

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_cookie(cookie)
            .json(&json!({ "name": "" }))
            .await;

        response.assert_status_bad_request();
    }
}
