//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The route to register a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";

/// The route to list and create accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to get, update and delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to delete many accounts at once.
pub const ACCOUNTS_BULK_DELETE: &str = "/api/accounts/bulk-delete";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to get, update and delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete many categories at once.
pub const CATEGORIES_BULK_DELETE: &str = "/api/categories/bulk-delete";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, update and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete many transactions at once.
pub const TRANSACTIONS_BULK_DELETE: &str = "/api/transactions/bulk-delete";
/// The route to create many transactions at once.
pub const TRANSACTIONS_BULK_CREATE: &str = "/api/transactions/bulk-create";
/// The route to upload a CSV file of transactions.
pub const TRANSACTIONS_IMPORT: &str = "/api/transactions/import";

/// The route for the summary analytics.
pub const SUMMARY: &str = "/api/summary";

/// The route to get the current user's subscription.
pub const SUBSCRIPTION_CURRENT: &str = "/api/subscriptions/current";
/// The route to start a checkout or open the billing portal.
pub const SUBSCRIPTION_CHECKOUT: &str = "/api/subscriptions/checkout";
/// The route the billing provider sends webhooks to.
pub const SUBSCRIPTION_WEBHOOK: &str = "/api/subscriptions/webhook";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
