//! The subscription model and the SQL queries for the subscription table.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserID, database_id::DatabaseId};

/// A user's subscription as last reported by the billing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// The id of the row in the application database.
    pub id: DatabaseId,
    /// The user that paid for the subscription.
    pub user_id: UserID,
    /// The billing provider's id for the subscription.
    pub subscription_id: String,
    /// The billing provider's status, e.g. "active", "cancelled" or "expired".
    pub status: String,
    /// When the row was last written by a webhook.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Create the subscription table.
///
/// There is at most one row per billing provider subscription.
pub fn create_subscription_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS subscription (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            subscription_id TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_subscription_user_id ON subscription(user_id);",
    )?;

    Ok(())
}

fn map_subscription_row(row: &Row) -> Result<Subscription, rusqlite::Error> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        subscription_id: row.get(2)?,
        status: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Get the most recently updated subscription of `user_id`, if they have one.
///
/// # Errors
/// Returns [Error::SqlError] if there is an unexpected SQL error.
pub fn get_user_subscription(
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<Subscription>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, subscription_id, status, updated_at
            FROM subscription
            WHERE user_id = ?1
            ORDER BY updated_at DESC, id DESC
            LIMIT 1",
        )?
        .query_row([user_id.as_i64()], map_subscription_row)
        .optional()
        .map_err(|error| error.into())
}

/// Insert the subscription, or update the status of the existing row with
/// the same `subscription_id`.
///
/// The owner of an existing row is never changed.
///
/// # Errors
/// Returns [Error::SqlError] if `user_id` does not refer to a user or there
/// is some other SQL error.
pub fn upsert_subscription(
    subscription_id: &str,
    user_id: UserID,
    status: &str,
    connection: &Connection,
) -> Result<Subscription, Error> {
    connection
        .prepare(
            "INSERT INTO subscription (user_id, subscription_id, status, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(subscription_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            RETURNING id, user_id, subscription_id, status, updated_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                subscription_id,
                status,
                OffsetDateTime::now_utc(),
            ),
            map_subscription_row,
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
pub fn count_subscriptions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM subscription", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod subscription_query_tests {
    use rusqlite::Connection;

    use crate::{db::initialize, test_utils::insert_test_user};

    use super::{count_subscriptions, get_user_subscription, upsert_subscription};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    #[test]
    fn user_without_subscription_gets_none() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");

        let got = get_user_subscription(user_id, &connection).unwrap();

        assert_eq!(got, None);
    }

    #[test]
    fn upsert_inserts_then_updates_status() {
        let connection = get_test_db_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");

        let inserted = upsert_subscription("sub_1", user_id, "active", &connection).unwrap();
        let updated = upsert_subscription("sub_1", user_id, "cancelled", &connection).unwrap();

        assert_eq!(inserted.id, updated.id);
        assert_eq!(updated.status, "cancelled");
        assert_eq!(count_subscriptions(&connection).unwrap(), 1);
        assert_eq!(
            get_user_subscription(user_id, &connection).unwrap(),
            Some(updated)
        );
    }

    #[test]
    fn upsert_keeps_original_owner() {
        let connection = get_test_db_connection();
        let owner = insert_test_user(&connection, "foo@bar.baz");
        let other_user = insert_test_user(&connection, "other@bar.baz");
        upsert_subscription("sub_1", owner, "active", &connection).unwrap();

        let updated = upsert_subscription("sub_1", other_user, "paused", &connection).unwrap();

        assert_eq!(updated.user_id, owner);
        assert_eq!(get_user_subscription(other_user, &connection).unwrap(), None);
    }
}
