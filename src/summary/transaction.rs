//! Database queries for retrieving summary transaction data.
//!
//! This module provides a simplified transaction view for the summary
//! aggregations, containing only the fields needed (amount, date, category).

use rusqlite::Connection;
use time::Date;

use crate::{Error, account::AccountId, auth::UserID, transaction::DateRange};

/// A simplified transaction view for summary aggregations.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Transaction {
    pub amount: f64,
    pub date: Date,
    pub category: Option<String>,
}

/// Gets the user's transactions and their category names within a date range.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query preparation or execution fails.
pub(super) fn get_transactions_in_date_range(
    date_range: DateRange,
    account_id: Option<AccountId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut stmt = connection.prepare(
        "SELECT t.amount, t.date, c.name
        FROM \"transaction\" t
        INNER JOIN account a ON a.id = t.account_id
        LEFT JOIN category c ON c.id = t.category_id
        WHERE a.user_id = ?1
          AND t.date BETWEEN ?2 AND ?3
          AND (?4 IS NULL OR t.account_id = ?4)",
    )?;

    stmt.query_map(
        (user_id.as_i64(), date_range.start, date_range.end, account_id),
        |row| {
            Ok(Transaction {
                amount: row.get(0)?,
                date: row.get(1)?,
                category: row.get(2)?,
            })
        },
    )?
    .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
    .map_err(|error| error.into())
}
