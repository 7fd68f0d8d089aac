//! fintrack is the REST API behind a personal finance dashboard.
//!
//! Users register and log in, manage their bank accounts and spending
//! categories, record or import transactions, view summary analytics and pay
//! for premium access through a Lemon Squeezy checkout.
//!
//! Every endpoint lives under `/api` and speaks JSON: successful responses are
//! wrapped as `{"data": ...}` and errors as `{"error": "..."}`.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod category;
mod csv_import;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod logging;
mod name;
mod not_found;
mod response;
mod routing;
mod subscription;
mod summary;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use subscription::{BillingConfig, LemonSqueezyClient};

use crate::{
    account::AccountId, category::CategoryId, not_found::get_404_not_found_response,
    response::render_error,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid auth cookie.
    #[error("unauthorized")]
    Unauthorized,

    /// The email and password combination did not match a registered user.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The webhook signature header was missing or did not match the body.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The user provided a string that is not a valid email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An empty string was used to name an account or category.
    #[error("name cannot be empty")]
    EmptyName,

    /// An empty string was used as the payee of a transaction.
    #[error("payee cannot be empty")]
    EmptyPayee,

    /// A transaction amount was NaN or infinite.
    #[error("amount must be a finite number")]
    NonFiniteAmount,

    /// The account ID does not refer to an account owned by the user.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// The category ID does not refer to a category owned by the user.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The start of a date range came after its end.
    #[error("the start date {0} is after the end date {1}")]
    InvalidDateRange(Date, Date),

    /// The requested period spans more days than are allowed.
    #[error("the date range spans {0} days, the most allowed is {max}", max = crate::transaction::MAX_PERIOD_DAYS)]
    PeriodTooLong(i64),

    /// A date range, or the period before it, falls outside the supported calendar.
    #[error("the date range is outside the supported calendar")]
    DateOutOfRange,

    /// The request body, query string or path parameters could not be
    /// deserialized. Holds the status and message from the rejecting extractor.
    #[error("{1}")]
    RejectedRequest(StatusCode, String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("file is not a CSV")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed.
    #[error("could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The webhook body was signed correctly but could not be understood.
    #[error("invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),

    /// A call to the billing provider failed or returned something unexpected.
    #[error("billing provider error: {0}")]
    BillingProviderError(String),

    /// The requested resource was not found.
    ///
    /// Resources owned by other users are reported as not found too.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::RejectedRequest(status, _) => *status,
            Error::Unauthorized | Error::InvalidCredentials | Error::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::EmptyName
            | Error::EmptyPayee
            | Error::NonFiniteAmount
            | Error::InvalidAccount(_)
            | Error::InvalidCategory(_)
            | Error::InvalidDateRange(_, _)
            | Error::PeriodTooLong(_)
            | Error::DateOutOfRange
            | Error::MultipartError(_)
            | Error::NotCSV
            | Error::InvalidCSV(_)
            | Error::InvalidWebhookPayload(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::JSONSerializationError(_)
            | Error::BillingProviderError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.status_code() {
            StatusCode::NOT_FOUND => get_404_not_found_response(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                // The details of internal errors are not intended to be shown to the client.
                tracing::error!("An unexpected error occurred: {}", self);
                render_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
            status => render_error(status, &self.to_string()),
        }
    }
}
