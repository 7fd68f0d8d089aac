//! Bank accounts that transactions are recorded against.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;

pub use core::{AccountId, create_account_table, ensure_account_owned};
#[cfg(test)]
pub use core::{create_account, delete_account, get_account, get_accounts};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::{bulk_delete_accounts_endpoint, delete_account_endpoint};
pub use edit_endpoint::edit_account_endpoint;
pub use get_endpoint::{get_account_endpoint, get_accounts_endpoint};
