//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    account::{
        bulk_delete_accounts_endpoint, create_account_endpoint, delete_account_endpoint,
        edit_account_endpoint, get_account_endpoint, get_accounts_endpoint,
    },
    auth::{auth_guard, post_log_in, post_log_out, register_user},
    category::{
        bulk_delete_categories_endpoint, create_category_endpoint, delete_category_endpoint,
        edit_category_endpoint, get_categories_endpoint, get_category_endpoint,
    },
    csv_import::import_transactions,
    endpoints,
    not_found::get_404_not_found,
    subscription::{checkout_endpoint, get_current_subscription_endpoint, subscription_webhook},
    summary::get_summary_endpoint,
    transaction::{
        bulk_create_transactions_endpoint, bulk_delete_transactions_endpoint,
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, get_transactions_endpoint,
    },
};

/// The largest CSV file, in bytes, that may be uploaded for import.
///
/// No route accepts a larger request body.
pub const IMPORT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::SUBSCRIPTION_WEBHOOK, post(subscription_webhook));

    let protected_routes = Router::new()
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNTS_BULK_DELETE,
            post(bulk_delete_accounts_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .patch(edit_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORIES_BULK_DELETE,
            post(bulk_delete_categories_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .patch(edit_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_BULK_CREATE,
            post(bulk_create_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_BULK_DELETE,
            post(bulk_delete_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_IMPORT,
            post(import_transactions).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::SUBSCRIPTION_CURRENT,
            get(get_current_subscription_endpoint),
        )
        .route(endpoints::SUBSCRIPTION_CHECKOUT, post(checkout_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
