//! Paid subscriptions through the Lemon Squeezy billing provider.
//!
//! Users start a checkout (or open the customer portal once subscribed) and
//! the provider reports the outcome through a signed webhook, which is the
//! only writer of the subscription table.

mod client;
mod core;
mod endpoints;
mod webhook;

pub use client::{BillingConfig, LemonSqueezyClient};
pub use core::create_subscription_table;
pub use endpoints::{checkout_endpoint, get_current_subscription_endpoint};
pub use webhook::subscription_webhook;
