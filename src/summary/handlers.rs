//! HTTP handler for the summary endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    extract::Query,
    account::AccountId,
    auth::UserID,
    response::render_data,
    summary::{
        aggregation::{
            CategorySpending, DaySummary, calculate_daily_totals, calculate_percentage_change,
            calculate_period_totals, group_expenses_by_category,
        },
        transaction::get_transactions_in_date_range,
    },
    timezone::get_local_date,
    transaction::{DateRange, PeriodQuery},
};

/// The state needed for the summary.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The analytics for a period, compared against the period of equal length
/// that came right before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Income plus expenses.
    pub remaining_amount: f64,
    /// Percentage change of `remaining_amount` from the previous period.
    pub remaining_change: f64,
    /// The sum of all income.
    pub income_amount: f64,
    /// Percentage change of `income_amount` from the previous period.
    pub income_change: f64,
    /// The sum of all expenses, zero or negative.
    pub expenses_amount: f64,
    /// Percentage change of `expenses_amount` from the previous period.
    pub expenses_change: f64,
    /// Spending by category, largest first.
    pub categories: Vec<CategorySpending>,
    /// Income and expenses for every day of the period.
    pub days: Vec<DaySummary>,
}

/// Build the summary for `date_range`.
fn build_summary(
    date_range: DateRange,
    account_id: Option<AccountId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Summary, Error> {
    let current = get_transactions_in_date_range(date_range, account_id, user_id, connection)?;
    let previous =
        get_transactions_in_date_range(date_range.previous()?, account_id, user_id, connection)?;

    let current_totals = calculate_period_totals(&current);
    let previous_totals = calculate_period_totals(&previous);

    Ok(Summary {
        remaining_amount: current_totals.remaining,
        remaining_change: calculate_percentage_change(
            current_totals.remaining,
            previous_totals.remaining,
        ),
        income_amount: current_totals.income,
        income_change: calculate_percentage_change(current_totals.income, previous_totals.income),
        expenses_amount: current_totals.expenses,
        expenses_change: calculate_percentage_change(
            current_totals.expenses,
            previous_totals.expenses,
        ),
        categories: group_expenses_by_category(&current),
        days: calculate_daily_totals(&current, date_range),
    })
}

/// A route handler for the summary of a period.
///
/// Accepts the optional query parameters `from`, `to` and `account_id`.
/// The period defaults to the last 30 days ending today.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;
    let date_range = query.date_range(today)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let summary = build_summary(date_range, query.account_id, user_id, &connection)?;

    Ok(render_data(StatusCode::OK, summary))
}
