//! Defines the core data models and database queries for transactions.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, ensure_account_owned},
    auth::UserID,
    category::{CategoryId, ensure_category_owned},
    database_id::{DatabaseId, DeletedRow},
    transaction::range::DateRange,
};

/// Database identifier for a transaction.
pub type TransactionId = DatabaseId;

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Who was paid, or who paid the user.
    pub payee: String,
    /// Free text notes about the transaction.
    pub notes: Option<String>,
    /// The account the transaction was made from.
    pub account_id: AccountId,
    /// The category the transaction is filed under.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    ///
    /// # Errors
    ///
    /// Returns [Error::NonFiniteAmount] if `amount` is NaN or infinite and
    /// [Error::EmptyPayee] if `payee` is empty or only whitespace.
    pub fn build(
        amount: f64,
        date: Date,
        payee: &str,
        account_id: AccountId,
    ) -> Result<TransactionBuilder, Error> {
        if !amount.is_finite() {
            return Err(Error::NonFiniteAmount);
        }

        let payee = payee.trim();

        if payee.is_empty() {
            return Err(Error::EmptyPayee);
        }

        Ok(TransactionBuilder {
            amount,
            date,
            payee: payee.to_owned(),
            notes: None,
            account_id,
            category_id: None,
        })
    }
}

/// A builder for creating [Transaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income/credits, negative values represent
    /// expenses/debits.
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// The trimmed, non-empty payee.
    pub payee: String,

    /// Optional free text notes.
    pub notes: Option<String>,

    /// The account the transaction belongs to.
    pub account_id: AccountId,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the notes for the transaction.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// A transaction along with the names of its account and category, as shown
/// in the transaction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    /// The transaction itself.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The name of the account the transaction was made from.
    pub account_name: String,
    /// The name of the transaction's category, if it has one.
    pub category_name: Option<String>,
}

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// Deleting an account deletes its transactions, deleting a category
/// leaves its transactions uncategorised.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            payee TEXT NOT NULL,
            notes TEXT,
            account_id INTEGER NOT NULL,
            category_id INTEGER,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_account_date ON \"transaction\"(account_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        payee: row.get(3)?,
        notes: row.get(4)?,
        account_id: row.get(5)?,
        category_id: row.get(6)?,
    })
}

/// Check that every account and category referenced by `builders` is owned by `user_id`.
fn ensure_references_owned(
    builders: &[TransactionBuilder],
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let mut checked_accounts = HashSet::new();
    let mut checked_categories = HashSet::new();

    for builder in builders {
        if checked_accounts.insert(builder.account_id) {
            ensure_account_owned(builder.account_id, user_id, connection)?;
        }

        if let Some(category_id) = builder.category_id
            && checked_categories.insert(category_id)
        {
            ensure_category_owned(category_id, user_id, connection)?;
        }
    }

    Ok(())
}

/// Insert all of `builders` as transactions owned by `user_id`.
///
/// Either every transaction is inserted or none are.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] if an account ID does not refer to one of the user's accounts,
/// - [Error::InvalidCategory] if a category ID does not refer to one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_transactions(
    builders: Vec<TransactionBuilder>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    ensure_references_owned(&builders, user_id, connection)?;

    let sql_transaction = connection.unchecked_transaction()?;
    let mut transactions = Vec::with_capacity(builders.len());

    {
        let mut statement = sql_transaction.prepare(
            "INSERT INTO \"transaction\" (amount, date, payee, notes, account_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, amount, date, payee, notes, account_id, category_id",
        )?;

        for builder in builders {
            let transaction = statement.query_row(
                (
                    builder.amount,
                    builder.date,
                    builder.payee,
                    builder.notes,
                    builder.account_id,
                    builder.category_id,
                ),
                map_transaction_row,
            )?;
            transactions.push(transaction);
        }
    }

    sql_transaction.commit()?;

    Ok(transactions)
}

/// Create a single transaction owned by `user_id`.
///
/// # Errors
/// See [insert_transactions].
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    insert_transactions(vec![builder], user_id, connection)?
        .pop()
        .ok_or(Error::NotFound)
}

/// Retrieve a transaction by its `id` if it belongs to one of `user_id`'s accounts.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT t.id, t.amount, t.date, t.payee, t.notes, t.account_id, t.category_id
             FROM \"transaction\" t
             INNER JOIN account a ON t.account_id = a.id
             WHERE t.id = :id AND a.user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get the user's transactions in `range`, optionally limited to one account.
///
/// Sorted by date, and then ID, both descending, to keep the order stable after updates.
pub fn get_transactions(
    range: DateRange,
    account_id: Option<AccountId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.amount, t.date, t.payee, t.notes, t.account_id, t.category_id,
                    a.name, c.name
             FROM \"transaction\" t
             INNER JOIN account a ON t.account_id = a.id
             LEFT JOIN category c ON t.category_id = c.id
             WHERE a.user_id = ?1
               AND t.date BETWEEN ?2 AND ?3
               AND (?4 IS NULL OR t.account_id = ?4)
             ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            (user_id.as_i64(), range.start, range.end, account_id),
            |row| {
                Ok(TransactionRow {
                    transaction: map_transaction_row(row)?,
                    account_name: row.get(7)?,
                    category_name: row.get(8)?,
                })
            },
        )?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}

/// Overwrite the transaction `id` with the fields in `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - [Error::InvalidAccount] or [Error::InvalidCategory] if the new account or
///   category is not owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    get_transaction(id, user_id, connection)?;
    ensure_references_owned(std::slice::from_ref(&builder), user_id, connection)?;

    let transaction = connection
        .prepare(
            "UPDATE \"transaction\"
             SET amount = ?1, date = ?2, payee = ?3, notes = ?4, account_id = ?5, category_id = ?6
             WHERE id = ?7
             RETURNING id, amount, date, payee, notes, account_id, category_id",
        )?
        .query_row(
            (
                builder.amount,
                builder.date,
                builder.payee,
                builder.notes,
                builder.account_id,
                builder.category_id,
                id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to one of the user's transactions.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\"
         WHERE id = ?1 AND account_id IN (SELECT id FROM account WHERE user_id = ?2)",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete every transaction in `ids` that belongs to one of the user's accounts.
///
/// Returns the IDs of the transactions that were deleted.
pub fn delete_transactions(
    ids: &[TransactionId],
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DeletedRow>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut deleted = Vec::with_capacity(ids.len());

    {
        let mut statement = sql_transaction.prepare(
            "DELETE FROM \"transaction\"
             WHERE id = ?1 AND account_id IN (SELECT id FROM account WHERE user_id = ?2)",
        )?;

        for &id in ids {
            if statement.execute((id, user_id.as_i64()))? != 0 {
                deleted.push(DeletedRow { id });
            }
        }
    }

    sql_transaction.commit()?;

    Ok(deleted)
}

/// Get the total number of transactions in the database.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

// ============================================================================
// TESTS
// ============================================================================
