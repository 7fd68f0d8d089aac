//! The request bodies for creating and updating transactions.

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    category::CategoryId,
    transaction::core::{Transaction, TransactionBuilder},
};

/// The body of a request to create a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction, negative for expenses.
    pub amount: f64,
    /// The date when the transaction ocurred.
    pub date: Date,
    /// Who was paid, or who paid the user.
    pub payee: String,
    /// Free text notes about the transaction.
    #[serde(default)]
    pub notes: Option<String>,
    /// The account the transaction was made from.
    pub account_id: AccountId,
    /// The category to file the transaction under.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl TransactionForm {
    /// Validate the form and turn it into a [TransactionBuilder].
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyPayee] if the payee is empty or only whitespace.
    pub fn into_builder(self) -> Result<TransactionBuilder, Error> {
        Ok(
            Transaction::build(self.amount, self.date, &self.payee, self.account_id)?
                .notes(self.notes)
                .category_id(self.category_id),
        )
    }
}

/// The body of a request to update some of the fields of a transaction.
///
/// Fields that are absent are left unchanged. `notes` and `category_id` may
/// be set to `null` to clear them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionPatch {
    /// The new amount.
    pub amount: Option<f64>,
    /// The new date.
    pub date: Option<Date>,
    /// The new payee.
    pub payee: Option<String>,
    /// The new notes, `Some(None)` clears them.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub notes: Option<Option<String>>,
    /// The new account.
    pub account_id: Option<AccountId>,
    /// The new category, `Some(None)` makes the transaction uncategorised.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub category_id: Option<Option<CategoryId>>,
}

impl TransactionPatch {
    /// Apply the changes in the patch on top of `transaction`.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyPayee] if the patch sets an empty payee.
    pub fn apply(self, transaction: Transaction) -> Result<TransactionBuilder, Error> {
        let payee = self.payee.unwrap_or(transaction.payee);

        Ok(Transaction::build(
            self.amount.unwrap_or(transaction.amount),
            self.date.unwrap_or(transaction.date),
            &payee,
            self.account_id.unwrap_or(transaction.account_id),
        )?
        .notes(self.notes.unwrap_or(transaction.notes))
        .category_id(self.category_id.unwrap_or(transaction.category_id)))
    }
}

/// Distinguishes a field that is present but `null` from a missing field.
///
/// Paired with `#[serde(default)]`, a missing field stays `None` and a present
/// field, including `null`, becomes `Some`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
