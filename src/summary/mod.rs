//! Summary analytics: totals, comparison with the previous period, spending
//! by category and a day-by-day breakdown.

mod aggregation;
mod handlers;
mod transaction;

pub use handlers::get_summary_endpoint;
