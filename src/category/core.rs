//! The category model and the SQL queries for the category table.

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

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// A spending category, e.g. 'Groceries' or 'Rent'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// The id for the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: Name,
}

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id,
        name: Name::new_unchecked(&raw_name),
    })
}

/// Create a category owned by `user_id` and return it with its generated ID.
pub fn create_category(
    name: Name,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, user_id) VALUES (?1, ?2)",
        (name.as_ref(), user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, name })
}

/// Retrieve the category with `category_id` if it is owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name FROM category WHERE id = :id AND user_id = :user_id")?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row_to_category,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the categories owned by `user_id`, ordered by ID.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM category WHERE user_id = :user_id ORDER BY id ASC")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename a category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn update_category(
    category_id: CategoryId,
    new_name: Name,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1 WHERE id = ?2 AND user_id = ?3",
        (new_name.as_ref(), category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Category {
        id: category_id,
        name: new_name,
    })
}

/// Delete a category owned by `user_id`.
///
/// Transactions in the category become uncategorised.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete every category in `category_ids` that is owned by `user_id`.
///
/// Returns the IDs of the categories that were deleted.
pub fn delete_categories(
    category_ids: &[CategoryId],
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DeletedRow>, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut deleted = Vec::with_capacity(category_ids.len());

    {
        let mut statement =
            transaction.prepare("DELETE FROM category WHERE id = ?1 AND user_id = ?2")?;

        for &id in category_ids {
            if statement.execute((id, user_id.as_i64()))? != 0 {
                deleted.push(DeletedRow { id });
            }
        }
    }

    transaction.commit()?;

    Ok(deleted)
}

/// Check that `category_id` refers to a category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if it does not.
pub fn ensure_category_owned(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match get_category(category_id, user_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidCategory(category_id)),
        Err(error) => Err(error),
    }
}
