//! Spending categories that transactions can be filed under.

mod core;
mod endpoints;

pub use core::{CategoryId, create_category_table, ensure_category_owned};
#[cfg(test)]
pub use core::{create_category, delete_category, get_categories};
pub use endpoints::{
    bulk_delete_categories_endpoint, create_category_endpoint, delete_category_endpoint,
    edit_category_endpoint, get_categories_endpoint, get_category_endpoint,
};
