//! Functions to parse transactions out of CSV files with a header row.

use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    Error,
    account::AccountId,
    transaction::{Transaction, TransactionBuilder},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The names of the header columns that hold each transaction field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// The column with the transaction amount.
    pub amount: String,
    /// The column with the transaction date.
    pub date: String,
    /// The column with the payee.
    pub payee: String,
    /// The column with the notes, the column may be absent from the file.
    pub notes: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            amount: "amount".to_owned(),
            date: "date".to_owned(),
            payee: "payee".to_owned(),
            notes: "notes".to_owned(),
        }
    }
}

struct ColumnIndices {
    amount: usize,
    date: usize,
    payee: usize,
    notes: Option<usize>,
}

impl ColumnIndices {
    fn from_headers(headers: &csv::StringRecord, mapping: &ColumnMapping) -> Result<Self, Error> {
        let find = |name: &str| headers.iter().position(|header| header == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::InvalidCSV(format!("missing column '{name}'")))
        };

        Ok(Self {
            amount: require(mapping.amount.as_str())?,
            date: require(mapping.date.as_str())?,
            payee: require(mapping.payee.as_str())?,
            notes: find(mapping.notes.as_str()),
        })
    }
}

/// Parse the date part of a CSV cell.
///
/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`, the time of day is discarded.
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text, DATE_FORMAT)
        .or_else(|_| {
            PrimitiveDateTime::parse(text, DATE_TIME_FORMAT).map(|date_time| date_time.date())
        })
        .ok()
}

/// Parse every row of `text` into a transaction for `account_id`.
///
/// The first row of `text` must be a header row naming the columns in `mapping`.
///
/// # Errors
///
/// Returns [Error::InvalidCSV] if a required column is missing or any row has
/// an amount or date that cannot be parsed, or an empty payee. No rows are
/// returned if any row is invalid.
pub fn parse_csv(
    text: &str,
    mapping: &ColumnMapping,
    account_id: AccountId,
) -> Result<Vec<TransactionBuilder>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .clone();
    let columns = ColumnIndices::from_headers(&headers, mapping)?;

    let mut transactions = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // Plus one for the header and one because lines are 1-indexed.
        let line_number = index + 2;
        let record = record.map_err(|error| {
            Error::InvalidCSV(format!("could not read line {line_number}: {error}"))
        })?;

        let raw_amount = record.get(columns.amount).unwrap_or_default();
        let amount = raw_amount
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| {
                Error::InvalidCSV(format!(
                    "could not parse '{raw_amount}' as an amount on line {line_number}"
                ))
            })?;

        let raw_date = record.get(columns.date).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| {
            Error::InvalidCSV(format!(
                "could not parse '{raw_date}' as a date on line {line_number}"
            ))
        })?;

        let payee = record.get(columns.payee).unwrap_or_default();
        let notes = columns
            .notes
            .and_then(|column| record.get(column))
            .filter(|notes| !notes.is_empty())
            .map(str::to_owned);

        let transaction = Transaction::build(amount, date, payee, account_id)
            .map_err(|_| Error::InvalidCSV(format!("empty payee on line {line_number}")))?
            .notes(notes);

        transactions.push(transaction);
    }

    Ok(transactions)
}
