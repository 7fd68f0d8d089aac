//! The endpoint the billing provider calls when a subscription changes.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use rusqlite::Connection;
use serde::Deserialize;
use sha2::Sha256;

use crate::{AppState, Error, auth::UserID, subscription::core::upsert_subscription};

type HmacSha256 = Hmac<Sha256>;

/// The header that carries the hex encoded HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// The state needed by the webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookState {
    /// The database connection for writing subscriptions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The secret the billing provider signs webhooks with.
    pub webhook_secret: String,
}

impl FromRef<AppState> for WebhookState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            webhook_secret: state.webhook_secret.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    meta: WebhookMeta,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookMeta {
    event_name: String,
    #[serde(default)]
    custom_data: Option<CustomData>,
}

#[derive(Debug, Deserialize)]
struct CustomData {
    user_id: CustomUserId,
}

/// Custom data is echoed back as it was sent, which may be a string or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CustomUserId {
    Number(i64),
    Text(String),
}

impl CustomUserId {
    fn parse(&self) -> Result<UserID, Error> {
        match self {
            CustomUserId::Number(id) => Ok(UserID::new(*id)),
            CustomUserId::Text(text) => text.trim().parse().map(UserID::new).map_err(|_| {
                Error::InvalidWebhookPayload(format!("'{text}' is not a valid user ID"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    id: String,
    attributes: WebhookAttributes,
}

#[derive(Debug, Deserialize)]
struct WebhookAttributes {
    status: Option<String>,
}

/// Check that `signature` is the hex encoded HMAC-SHA256 of `body` keyed with `secret`.
///
/// The comparison takes constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// A route handler for billing provider webhooks.
///
/// The body must be signed with the webhook secret, otherwise the request is
/// rejected with 401 and nothing is written. `subscription_created` and
/// `subscription_updated` events upsert the subscription, all other events are
/// acknowledged and ignored.
///
/// A correctly signed body that is not a valid event is a client error and
/// gets 400 rather than 500 (see "Webhook" under the open question decisions
/// in DESIGN.md).
pub async fn subscription_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, Error> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Webhook request without a signature");
            Error::InvalidSignature
        })?;

    if !verify_signature(&state.webhook_secret, &body, signature) {
        tracing::warn!("Webhook request with an invalid signature");
        return Err(Error::InvalidSignature);
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|error| Error::InvalidWebhookPayload(error.to_string()))?;
    let event_name = payload.meta.event_name.as_str();

    if !matches!(event_name, "subscription_created" | "subscription_updated") {
        tracing::debug!("Ignoring webhook event '{event_name}'");
        return Ok((StatusCode::OK, Json(serde_json::json!({}))).into_response());
    }

    let user_id = payload
        .meta
        .custom_data
        .as_ref()
        .ok_or_else(|| Error::InvalidWebhookPayload("missing field 'custom_data'".to_owned()))?
        .user_id
        .parse()?;
    let status = payload
        .data
        .attributes
        .status
        .ok_or_else(|| Error::InvalidWebhookPayload("missing field 'status'".to_owned()))?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let subscription = upsert_subscription(&payload.data.id, user_id, &status, &connection)?;

    tracing::info!(
        "Subscription {} of user {} is now '{}' after '{event_name}'",
        subscription.subscription_id,
        subscription.user_id,
        subscription.status
    );

    Ok((StatusCode::OK, Json(serde_json::json!({}))).into_response())
}
