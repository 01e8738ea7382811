//! Ordering backend REST client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; bearer-token auth per call
//! - The backend is source of truth - NO local sync, direct API calls
//! - Catalog reads (businesses, categories, items) are cached in memory via
//!   `moka`; carts, addresses, auth and orders are never cached
//! - No automatic retries: a 429 surfaces as [`BackendError::RateLimited`]
//!   with the server's `Retry-After`
//!
//! # Example
//!
//! ```rust,ignore
//! use nightcap_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let businesses = client.businesses().await?;
//! let quote = client
//!     .delivery_quote(token, businesses[0].id, address_id)
//!     .await?;
//! ```

mod cache;
pub mod endpoint;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use nightcap_core::{AddressId, BusinessId, CardId, CategoryId, ItemId, OrderId, PhoneNumber};

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};
pub use types::*;

/// Header carrying the storefront's own API key, when configured.
const API_KEY_HEADER: &str = "X-Api-Key";

/// How much of an unexpected response body to keep in logs and errors.
const BODY_SNIPPET_CHARS: usize = 500;

/// Errors that can occur when talking to the ordering backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A URL could not be built from the configured base.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Client setup failed.
    #[error("Backend client configuration error: {0}")]
    Config(String),

    /// Bearer token missing, expired or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl BackendError {
    /// Whether the backend rejected the request itself (4xx other than auth,
    /// not-found and rate limiting), as opposed to failing.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}

/// Error body shape the backend uses for 4xx/5xx responses.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

/// Pull a human-readable message out of an error response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(BODY_SNIPPET_CHARS).collect(),
        |parsed| parsed.message,
    )
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the ordering backend.
///
/// Cheap to clone; all clones share one connection pool and one catalog cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: url::Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(api_key.expose_secret())
                .map_err(|e| BackendError::Config(format!("invalid API key format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Build a request for `path`, attaching the bearer token if given.
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        let url = endpoint::api_url(&self.inner.base_url, path, query)?;
        let request = self.inner.client.request(method, url);
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Send a request and return the body of a successful response.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path.to_string()));
        }

        let body = response.text().await?;

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    path,
                    body = %body.chars().take(BODY_SNIPPET_CHARS).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                tracing::debug!(status = %status, path, "Backend rejected request");
            }
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, BackendError> {
        let body = self.send(request, path).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %body.chars().take(BODY_SNIPPET_CHARS).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        let request = self.request(Method::GET, path, query, token)?;
        self.execute(request, path).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, BackendError> {
        let request = self.request(Method::POST, path, &[], token)?.json(body);
        self.execute(request, path).await
    }

    async fn delete(&self, path: &str, token: Option<&str>) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, path, &[], token)?;
        self.send(request, path).await.map(drop)
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Ping the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        let request = self.request(Method::GET, "health", &[], None)?;
        self.send(request, "health").await.map(drop)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Ask the backend to text a sign-in code to `phone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, phone), fields(phone = %phone.masked()))]
    pub async fn send_code(&self, phone: &PhoneNumber) -> Result<SendCodeResponse, BackendError> {
        self.post(
            "auth/send-code",
            &SendCodeRequest {
                phone: phone.as_str(),
            },
            None,
        )
        .await
    }

    /// Exchange a texted code for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is wrong or the API request fails.
    #[instrument(skip(self, phone, code, session_token), fields(phone = %phone.masked()))]
    pub async fn verify_code(
        &self,
        phone: &PhoneNumber,
        code: &str,
        session_token: &str,
    ) -> Result<VerifyCodeResponse, BackendError> {
        self.post(
            "auth/verify-code",
            &VerifyCodeRequest {
                phone: phone.as_str(),
                code,
                session_token,
            },
            None,
        )
        .await
    }

    // =========================================================================
    // Catalog (cached)
    // =========================================================================

    /// List all businesses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn businesses(&self) -> Result<Vec<Business>, BackendError> {
        if let Some(CacheValue::Businesses(list)) =
            self.inner.cache.get(&CacheKey::Businesses).await
        {
            debug!("Cache hit for businesses");
            return Ok(list);
        }

        let list: Vec<Business> = self.get("businesses", &[], None).await?;

        self.inner
            .cache
            .insert(CacheKey::Businesses, CacheValue::Businesses(list.clone()))
            .await;

        Ok(list)
    }

    /// Find a single business by ID.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no business has this ID.
    pub async fn business(&self, id: BusinessId) -> Result<Business, BackendError> {
        self.businesses()
            .await?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("business {id}")))
    }

    /// List the categories of a business.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(business_id = %business_id))]
    pub async fn categories(&self, business_id: BusinessId) -> Result<Vec<Category>, BackendError> {
        let key = CacheKey::Categories(business_id);
        if let Some(CacheValue::Categories(list)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for categories");
            return Ok(list);
        }

        let path = format!("businesses/{business_id}/categories");
        let list: Vec<Category> = self.get(&path, &[], None).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Categories(list.clone()))
            .await;

        Ok(list)
    }

    /// List the items in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(business_id = %business_id, category_id = %category_id))]
    pub async fn items(
        &self,
        business_id: BusinessId,
        category_id: CategoryId,
    ) -> Result<Vec<Item>, BackendError> {
        let key = CacheKey::Items {
            business_id,
            category_id,
        };
        if let Some(CacheValue::Items(list)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for items");
            return Ok(list);
        }

        let path = format!("businesses/{business_id}/categories/{category_id}/items");
        let list: Vec<Item> = self.get(&path, &[], None).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Items(list.clone()))
            .await;

        Ok(list)
    }

    /// Get one item with its modifier groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not found or the API request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn item(&self, item_id: ItemId) -> Result<Item, BackendError> {
        let key = CacheKey::Item(item_id);
        if let Some(CacheValue::Item(item)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for item");
            return Ok(*item);
        }

        self.item_fresh(item_id).await
    }

    /// Get one item straight from the backend, skipping the cache.
    ///
    /// Used where stock and price must be current (adding to the cart). The
    /// fresh copy replaces any cached one.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not found or the API request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn item_fresh(&self, item_id: ItemId) -> Result<Item, BackendError> {
        let item: Item = self.get(&format!("items/{item_id}"), &[], None).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Item(item_id),
                CacheValue::Item(Box::new(item.clone())),
            )
            .await;

        Ok(item)
    }

    // =========================================================================
    // Addresses & delivery
    // =========================================================================

    /// List the customer's saved addresses, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &str) -> Result<Vec<Address>, BackendError> {
        self.get("addresses", &[], Some(token)).await
    }

    /// Geocode free text into address suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn search_addresses(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<AddressSuggestion>, BackendError> {
        self.get(
            "addresses/search",
            &[("query", query.to_string())],
            Some(token),
        )
        .await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, address))]
    pub async fn create_address(
        &self,
        token: &str,
        address: &NewAddress,
    ) -> Result<Address, BackendError> {
        self.post("addresses", address, Some(token)).await
    }

    /// Soft-delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn delete_address(&self, token: &str, id: AddressId) -> Result<(), BackendError> {
        self.delete(&format!("addresses/{id}"), Some(token)).await
    }

    /// Delivery eligibility and price for an address served from a business.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(business_id = %business_id, address_id = %address_id))]
    pub async fn delivery_quote(
        &self,
        token: &str,
        business_id: BusinessId,
        address_id: AddressId,
    ) -> Result<DeliveryQuote, BackendError> {
        self.get(
            "delivery/quote",
            &[
                ("business_id", business_id.to_string()),
                ("address_id", address_id.to_string()),
            ],
            Some(token),
        )
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order or the request fails.
    #[instrument(skip(self, token, order), fields(business_id = %order.business_id, lines = order.items.len()))]
    pub async fn create_order(
        &self,
        token: &str,
        order: &OrderRequest,
    ) -> Result<Order, BackendError> {
        self.post("orders", order, Some(token)).await
    }

    /// List the customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.get("orders", &[], Some(token)).await
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order(&self, token: &str, id: OrderId) -> Result<Order, BackendError> {
        self.get(&format!("orders/{id}"), &[], Some(token)).await
    }

    /// Charge an order to a saved card.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is declined or the request fails.
    #[instrument(skip(self, token), fields(order_id = %order_id, card_id = %card_id))]
    pub async fn pay_order(
        &self,
        token: &str,
        order_id: OrderId,
        card_id: CardId,
    ) -> Result<PaymentResult, BackendError> {
        self.post(
            &format!("orders/{order_id}/pay"),
            &PayOrderRequest { card_id },
            Some(token),
        )
        .await
    }

    // =========================================================================
    // Cards
    // =========================================================================

    /// List saved cards.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn cards(&self, token: &str) -> Result<Vec<Card>, BackendError> {
        self.get("cards", &[], Some(token)).await
    }

    /// Start saving a card. The returned URL is the bank-hosted form; the bank
    /// sends the customer to `return_url` when done.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn begin_card_setup(
        &self,
        token: &str,
        return_url: &str,
    ) -> Result<CardSetup, BackendError> {
        self.post("cards", &CardSetupRequest { return_url }, Some(token))
            .await
    }

    /// Remove a saved card.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(card_id = %id))]
    pub async fn delete_card(&self, token: &str, id: CardId) -> Result<(), BackendError> {
        self.delete(&format!("cards/{id}"), Some(token)).await
    }
}
