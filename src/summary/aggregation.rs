//! Transaction data aggregation for the summary.
//!
//! Provides functions to total income and expenses, compare periods, group
//! expenses by category and bucket transactions by day.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{summary::transaction::Transaction, transaction::DateRange};

/// The label for the bucket that collects all but the largest categories.
pub(super) const OTHER_CATEGORY_LABEL: &str = "Other";

/// How many categories are reported before the rest are grouped together.
pub(super) const TOP_CATEGORY_COUNT: usize = 3;

/// The income, expenses and net amount of a period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct PeriodTotals {
    /// The sum of all non-negative amounts.
    pub income: f64,
    /// The sum of all negative amounts, this is negative or zero.
    pub expenses: f64,
    /// The sum of all amounts.
    pub remaining: f64,
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    /// The category name, or "Other" for the grouped remainder.
    pub name: String,
    /// The absolute amount spent.
    pub value: f64,
}

/// The income and expenses of a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    /// The calendar date.
    pub date: Date,
    /// The sum of the day's income.
    pub income: f64,
    /// The absolute sum of the day's expenses.
    pub expenses: f64,
}

/// Sums the income, expenses and net amount of `transactions`.
pub(super) fn calculate_period_totals(transactions: &[Transaction]) -> PeriodTotals {
    transactions
        .iter()
        .fold(PeriodTotals::default(), |mut totals, transaction| {
            if transaction.amount >= 0.0 {
                totals.income += transaction.amount;
            } else {
                totals.expenses += transaction.amount;
            }
            totals.remaining += transaction.amount;
            totals
        })
}

/// The change from `previous` to `current` as a percentage of `previous`.
///
/// A change from zero is reported as 0% if `current` is also zero, otherwise 100%.
pub(super) fn calculate_percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }

    (current - previous) / previous * 100.0
}

/// Groups expenses by category, largest first.
///
/// The [TOP_CATEGORY_COUNT] largest categories are returned by name and the
/// rest are summed into a single "Other" entry. Uncategorised transactions
/// and income are ignored.
pub(super) fn group_expenses_by_category(transactions: &[Transaction]) -> Vec<CategorySpending> {
    let mut totals_by_category: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.amount < 0.0) {
        if let Some(category) = &transaction.category {
            *totals_by_category.entry(category.as_str()).or_insert(0.0) +=
                transaction.amount.abs();
        }
    }

    let mut categories: Vec<CategorySpending> = totals_by_category
        .into_iter()
        .map(|(name, value)| CategorySpending {
            name: name.to_owned(),
            value,
        })
        .collect();
    // Ties are broken by name so the output is stable.
    categories.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    if categories.len() <= TOP_CATEGORY_COUNT {
        return categories;
    }

    let other_value = categories
        .split_off(TOP_CATEGORY_COUNT)
        .iter()
        .map(|category| category.value)
        .sum();
    categories.push(CategorySpending {
        name: OTHER_CATEGORY_LABEL.to_owned(),
        value: other_value,
    });

    categories
}

/// Buckets income and expenses by day for every day in `date_range`.
///
/// Days without transactions are included with zero income and expenses.
pub(super) fn calculate_daily_totals(
    transactions: &[Transaction],
    date_range: DateRange,
) -> Vec<DaySummary> {
    let mut totals_by_day: HashMap<Date, (f64, f64)> = HashMap::new();

    for transaction in transactions {
        let (income, expenses) = totals_by_day.entry(transaction.date).or_insert((0.0, 0.0));

        if transaction.amount >= 0.0 {
            *income += transaction.amount;
        } else {
            *expenses += transaction.amount.abs();
        }
    }

    date_range
        .days()
        .map(|date| {
            let (income, expenses) = totals_by_day.get(&date).copied().unwrap_or((0.0, 0.0));
            DaySummary {
                date,
                income,
                expenses,
            }
        })
        .collect()
}
