//! Route handlers for reading the current subscription and starting a checkout.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    response::render_data,
    subscription::{LemonSqueezyClient, core::get_user_subscription},
};

/// The state needed by the subscription endpoints.
#[derive(Debug, Clone)]
pub struct SubscriptionState {
    /// The database connection for reading subscriptions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The client for the billing provider's REST API.
    pub billing_client: LemonSqueezyClient,
}

impl FromRef<AppState> for SubscriptionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            billing_client: state.billing_client.clone(),
        }
    }
}

/// A route handler that responds with the user's subscription, or `null` if
/// they have never subscribed.
pub async fn get_current_subscription_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let subscription = get_user_subscription(user_id, &connection)?;

    Ok(render_data(StatusCode::OK, subscription))
}

/// A route handler that responds with the URL the user should visit to pay.
///
/// Users that already have a subscription get the billing provider's customer
/// portal, everyone else gets a new checkout.
pub async fn checkout_endpoint(
    State(state): State<SubscriptionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let existing = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_subscription(user_id, &connection)?
    };

    let url = match existing {
        Some(subscription) => {
            state
                .billing_client
                .get_customer_portal_url(&subscription.subscription_id)
                .await?
        }
        None => state.billing_client.create_checkout(user_id).await?,
    };

    Ok(render_data(StatusCode::OK, url))
}
