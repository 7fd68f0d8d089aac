//! Transaction management for the finance dashboard.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod get_endpoint;
mod range;

pub use core::{Transaction, TransactionBuilder, create_transaction_table, insert_transactions};
pub use create_endpoint::{bulk_create_transactions_endpoint, create_transaction_endpoint};
pub use delete_endpoint::{bulk_delete_transactions_endpoint, delete_transaction_endpoint};
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::{get_transaction_endpoint, get_transactions_endpoint};
pub use range::{DateRange, MAX_PERIOD_DAYS, PeriodQuery};

#[cfg(test)]
pub use core::{
    count_transactions, create_transaction, delete_transaction, delete_transactions,
    get_transaction, get_transactions, update_transaction,
};
#[cfg(test)]
pub use form::TransactionPatch;
