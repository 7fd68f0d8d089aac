//! Date-range helpers shared by the transaction list and the summary.

use serde::Deserialize;
use time::{Date, Duration};

use crate::{Error, account::AccountId};

/// The number of days before today that a period starts when the client
/// does not specify a start date.
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// The longest period, in days, that may be requested. This is ten years
/// counting leap days.
pub const MAX_PERIOD_DAYS: i64 = 3_653;

/// The query string accepted by endpoints that report on a period of time.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PeriodQuery {
    /// The first day of the period, inclusive.
    pub from: Option<Date>,
    /// The last day of the period, inclusive.
    pub to: Option<Date>,
    /// Restrict the report to a single account.
    pub account_id: Option<AccountId>,
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day in the range.
    pub start: Date,
    /// The last day in the range.
    pub end: Date,
}

impl PeriodQuery {
    /// Resolve the requested period, filling in missing bounds.
    ///
    /// A missing `to` defaults to `today` and a missing `from` defaults to
    /// [DEFAULT_PERIOD_DAYS] days before `today`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDateRange] if the start of the period comes after its end,
    /// [Error::PeriodTooLong] if it spans more than [MAX_PERIOD_DAYS] days and
    /// [Error::DateOutOfRange] if the period before it would start before the
    /// earliest representable date.
    pub fn date_range(&self, today: Date) -> Result<DateRange, Error> {
        let start = match self.from {
            Some(from) => from,
            None => today
                .checked_sub(Duration::days(DEFAULT_PERIOD_DAYS))
                .ok_or(Error::DateOutOfRange)?,
        };
        let end = self.to.unwrap_or(today);

        if start > end {
            return Err(Error::InvalidDateRange(start, end));
        }

        let range = DateRange { start, end };
        let length = range.len_days();
        if length > MAX_PERIOD_DAYS {
            return Err(Error::PeriodTooLong(length));
        }

        range.previous()?;

        Ok(range)
    }
}

impl DateRange {
    /// The number of days in the range, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }

    /// The range of equal length that ends the day before this one starts.
    ///
    /// # Errors
    ///
    /// Returns [Error::DateOutOfRange] if that range would start before the
    /// earliest representable date.
    pub fn previous(&self) -> Result<DateRange, Error> {
        let length = Duration::days(self.len_days());

        match (self.start.checked_sub(length), self.end.checked_sub(length)) {
            (Some(start), Some(end)) => Ok(DateRange { start, end }),
            _ => Err(Error::DateOutOfRange),
        }
    }

    /// Iterate over every date in the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = Date> + use<> {
        let end = self.end;

        std::iter::successors(Some(self.start), move |&date| {
            date.next_day().filter(|next| *next <= end)
        })
    }
}
