//! A minimal client for the Lemon Squeezy REST API.

use reqwest::{
    Client, Response,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, auth::UserID};

/// The media type of JSON:API documents.
const JSON_API: &str = "application/vnd.api+json";

/// Error bodies from the billing provider are truncated to this many bytes in the logs.
const ERROR_BODY_LOG_LIMIT: usize = 500;

/// The settings for talking to the billing provider.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// The base URL of the REST API, e.g. "https://api.lemonsqueezy.com".
    pub api_url: String,
    /// The secret API key sent as a bearer token.
    pub api_key: String,
    /// The store that sells the subscription.
    pub store_id: String,
    /// The product variant that is checked out.
    pub product_id: String,
    /// The secret the provider signs webhooks with.
    pub webhook_secret: String,
    /// The public URL of the app, where users land after checking out.
    pub app_url: String,
}

/// A client for creating checkouts and fetching subscriptions.
#[derive(Debug, Clone)]
pub struct LemonSqueezyClient {
    client: Client,
    config: BillingConfig,
}

#[derive(Debug, Serialize)]
struct NewCheckoutDocument {
    data: NewCheckout,
}

#[derive(Debug, Serialize)]
struct NewCheckout {
    #[serde(rename = "type")]
    resource_type: &'static str,
    attributes: NewCheckoutAttributes,
    relationships: NewCheckoutRelationships,
}

#[derive(Debug, Serialize)]
struct NewCheckoutAttributes {
    checkout_data: CheckoutData,
    product_options: ProductOptions,
}

#[derive(Debug, Serialize)]
struct CheckoutData {
    custom: CheckoutCustomData,
}

#[derive(Debug, Serialize)]
struct CheckoutCustomData {
    user_id: String,
}

#[derive(Debug, Serialize)]
struct ProductOptions {
    redirect_url: String,
}

#[derive(Debug, Serialize)]
struct NewCheckoutRelationships {
    store: Relationship,
    variant: Relationship,
}

#[derive(Debug, Serialize)]
struct Relationship {
    data: ResourceIdentifier,
}

#[derive(Debug, Serialize)]
struct ResourceIdentifier {
    #[serde(rename = "type")]
    resource_type: &'static str,
    id: String,
}

impl Relationship {
    fn new(resource_type: &'static str, id: &str) -> Self {
        Self {
            data: ResourceIdentifier {
                resource_type,
                id: id.to_owned(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Document<A> {
    data: Resource<A>,
}

#[derive(Debug, Deserialize)]
struct Resource<A> {
    attributes: A,
}

#[derive(Debug, Deserialize)]
struct CheckoutAttributes {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionAttributes {
    urls: Option<SubscriptionUrls>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionUrls {
    customer_portal: Option<String>,
}

impl LemonSqueezyClient {
    /// Create a client that uses the API at `config.api_url`.
    pub fn new(config: BillingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a checkout for the subscription product and return its URL.
    ///
    /// The checkout carries `user_id` as custom data so that webhooks about
    /// the resulting subscription can be matched to the user.
    ///
    /// # Errors
    /// Returns [Error::BillingProviderError] if the request fails or the
    /// response does not contain a checkout URL.
    pub async fn create_checkout(&self, user_id: UserID) -> Result<String, Error> {
        let url = format!("{}/v1/checkouts", self.config.api_url);
        let body = NewCheckoutDocument {
            data: NewCheckout {
                resource_type: "checkouts",
                attributes: NewCheckoutAttributes {
                    checkout_data: CheckoutData {
                        custom: CheckoutCustomData {
                            user_id: user_id.to_string(),
                        },
                    },
                    product_options: ProductOptions {
                        redirect_url: format!("{}/", self.config.app_url.trim_end_matches('/')),
                    },
                },
                relationships: NewCheckoutRelationships {
                    store: Relationship::new("stores", &self.config.store_id),
                    variant: Relationship::new("variants", &self.config.product_id),
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API)
            .json(&body)
            .send()
            .await
            .map_err(|error| Error::BillingProviderError(format!("create checkout: {error}")))?;

        let document: Document<CheckoutAttributes> =
            parse_response(response, "create checkout").await?;

        document
            .data
            .attributes
            .url
            .ok_or_else(|| Error::BillingProviderError("checkout URL is missing".to_owned()))
    }

    /// Fetch the subscription `subscription_id` and return its customer portal URL.
    ///
    /// # Errors
    /// Returns [Error::BillingProviderError] if the request fails or the
    /// response does not contain a customer portal URL.
    pub async fn get_customer_portal_url(&self, subscription_id: &str) -> Result<String, Error> {
        let url = format!("{}/v1/subscriptions/{subscription_id}", self.config.api_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, JSON_API)
            .send()
            .await
            .map_err(|error| Error::BillingProviderError(format!("get subscription: {error}")))?;

        let document: Document<SubscriptionAttributes> =
            parse_response(response, "get subscription").await?;

        document
            .data
            .attributes
            .urls
            .and_then(|urls| urls.customer_portal)
            .ok_or_else(|| Error::BillingProviderError("customer portal URL is missing".to_owned()))
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: Response,
    action: &str,
) -> Result<T, Error> {
    let status = response.status();

    if !status.is_success() {
        let mut error_text = response.text().await.unwrap_or_default();
        if error_text.len() > ERROR_BODY_LOG_LIMIT {
            let mut end = ERROR_BODY_LOG_LIMIT;
            while !error_text.is_char_boundary(end) {
                end -= 1;
            }
            error_text.truncate(end);
        }

        return Err(Error::BillingProviderError(format!(
            "{action} failed ({status}): {error_text}"
        )));
    }

    response
        .json()
        .await
        .map_err(|error| Error::BillingProviderError(format!("{action}: {error}")))
}
