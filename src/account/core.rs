//! The account model and the SQL queries for the account table.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::{DatabaseId, DeletedRow},
    name::Name,
};

/// Database identifier for an account.
pub type AccountId = DatabaseId;

/// A bank account or credit card that transactions are recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The display name of the account, e.g. "Everyday".
    pub name: Name,
}

/// The state needed by the account endpoints.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the account table.
///
/// Accounts are removed along with the user that owns them.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_account_user_id ON account(user_id);",
    )?;

    Ok(())
}

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;

    Ok(Account {
        id,
        name: Name::new_unchecked(&raw_name),
    })
}

/// Create an account owned by `user_id` and return it with its generated ID.
pub fn create_account(
    name: Name,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO account (name, user_id) VALUES (?1, ?2)",
        (name.as_ref(), user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Account { id, name })
}

/// Retrieve the account with `account_id` if it is owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, name FROM account WHERE id = :id AND user_id = :user_id")?
        .query_row(
            &[(":id", &account_id), (":user_id", &user_id.as_i64())],
            map_row_to_account,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the accounts owned by `user_id`, ordered by ID.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name FROM account WHERE user_id = :user_id ORDER BY id ASC")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Rename an account owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn update_account(
    account_id: AccountId,
    new_name: Name,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET name = ?1 WHERE id = ?2 AND user_id = ?3",
        (new_name.as_ref(), account_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Account {
        id: account_id,
        name: new_name,
    })
}

/// Delete an account owned by `user_id` along with its transactions.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn delete_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        (account_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete every account in `account_ids` that is owned by `user_id`.
///
/// IDs that do not refer to one of the user's accounts are skipped.
/// Returns the IDs of the accounts that were deleted.
pub fn delete_accounts(
    account_ids: &[AccountId],
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DeletedRow>, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut deleted = Vec::with_capacity(account_ids.len());

    {
        let mut statement =
            transaction.prepare("DELETE FROM account WHERE id = ?1 AND user_id = ?2")?;

        for &id in account_ids {
            if statement.execute((id, user_id.as_i64()))? != 0 {
                deleted.push(DeletedRow { id });
            }
        }
    }

    transaction.commit()?;

    Ok(deleted)
}

/// Check that `account_id` refers to an account owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::InvalidAccount] if it does not.
pub fn ensure_account_owned(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match get_account(account_id, user_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidAccount(account_id)),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod account_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::core::{
            create_account, delete_account, delete_accounts, ensure_account_owned, get_account,
            get_accounts, update_account,
        },
        database_id::DeletedRow,
        db::initialize,
        name::Name,
        test_utils::insert_test_user,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    #[test]
    fn create_account_succeeds() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");
        let name = Name::new("Everyday").unwrap();

        let account = create_account(name.clone(), user_id, &connection).unwrap();

        assert!(account.id > 0);
        assert_eq!(account.name, name);
    }

    #[test]
    fn get_account_of_other_user_returns_not_found() {
        let connection = get_test_db_connection();
        let owner = insert_test_user(&connection, "owner@bar.baz");
        let other = insert_test_user(&connection, "other@bar.baz");
        let account = create_account(Name::new_unchecked("Savings"), owner, &connection).unwrap();

        assert_eq!(
            get_account(account.id, other, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_account(account.id, owner, &connection), Ok(account));
    }

    #[test]
    fn get_accounts_only_returns_own_accounts_in_id_order() {
        let connection = get_test_db_connection();
        let owner = insert_test_user(&connection, "owner@bar.baz");
        let other = insert_test_user(&connection, "other@bar.baz");
        let first = create_account(Name::new_unchecked("B"), owner, &connection).unwrap();
        create_account(Name::new_unchecked("Theirs"), other, &connection).unwrap();
        let second = create_account(Name::new_unchecked("A"), owner, &connection).unwrap();

        let accounts = get_accounts(owner, &connection).unwrap();

        assert_eq!(accounts, vec![first, second]);
    }

    #[test]
    fn update_account_of_other_user_returns_not_found() {
        let connection = get_test_db_connection();
        let owner = insert_test_user(&connection, "owner@bar.baz");
        let other = insert_test_user(&connection, "other@bar.baz");
        let account = create_account(Name::new_unchecked("Savings"), owner, &connection).unwrap();

        let result = update_account(account.id, Name::new_unchecked("Mine"), other, &connection);

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(
            get_account(account.id, owner, &connection).unwrap().name,
            Name::new_unchecked("Savings")
        );
    }

    #[test]
    fn delete_missing_account_returns_not_found() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");

        assert_eq!(
            delete_account(1337, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_accounts_removes_only_requested_owned_rows() {
        let connection = get_test_db_connection();
        let owner = insert_test_user(&connection, "owner@bar.baz");
        let other = insert_test_user(&connection, "other@bar.baz");
        let a = create_account(Name::new_unchecked("A"), owner, &connection).unwrap();
        let b = create_account(Name::new_unchecked("B"), owner, &connection).unwrap();
        let c = create_account(Name::new_unchecked("C"), owner, &connection).unwrap();
        let theirs = create_account(Name::new_unchecked("D"), other, &connection).unwrap();

        let deleted = delete_accounts(&[a.id, c.id, theirs.id, 999], owner, &connection).unwrap();

        assert_eq!(deleted, vec![DeletedRow { id: a.id }, DeletedRow { id: c.id }]);
        assert_eq!(get_accounts(owner, &connection).unwrap(), vec![b]);
        assert_eq!(get_accounts(other, &connection).unwrap(), vec![theirs]);
    }

    #[test]
    fn ensure_account_owned_rejects_foreign_account() {
        let connection = get_test_db_connection();
        let owner = insert_test_user(&connection, "owner@bar.baz");
        let other = insert_test_user(&connection, "other@bar.baz");
        let account = create_account(Name::new_unchecked("A"), owner, &connection).unwrap();

        assert_eq!(ensure_account_owned(account.id, owner, &connection), Ok(()));
        assert_eq!(
            ensure_account_owned(account.id, other, &connection),
            Err(Error::InvalidAccount(account.id))
        );
    }
}
