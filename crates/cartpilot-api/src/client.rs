//! HTTP client for the storefront cart endpoints.
//!
//! Wraps reqwest. Mutating calls are JSON `POST`s carrying the CSRF token in
//! an `X-CSRFToken` header; the count read is a plain `GET` without it. HTTP
//! status is not inspected — the server encodes outcomes in the response
//! body (`success` flags), and error statuses still carry parseable bodies.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::types::{
    AddToCartResponse, CartCountResponse, CheckoutResponse, QtyAction, RemoveItemResponse,
    UpdateCartResponse,
};

/// Header carrying the anti-forgery token on every mutating request.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Errors from storefront API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// The operations the cart controller performs against the shop.
///
/// The production implementation is [`StorefrontClient`]; tests drive the
/// controller through scripted implementations of this trait.
#[async_trait]
pub trait Storefront: Send + Sync {
    /// `GET /cart_count`.
    async fn cart_count(&self) -> Result<CartCountResponse, ApiError>;

    /// `POST /add_to_cart` with `{id}`.
    async fn add_to_cart(&self, id: i64) -> Result<AddToCartResponse, ApiError>;

    /// `POST /update_cart` with `{id, action}`.
    async fn update_cart(
        &self,
        id: &str,
        action: QtyAction,
    ) -> Result<UpdateCartResponse, ApiError>;

    /// `POST /remove_item` with `{id}`.
    async fn remove_item(&self, id: &str) -> Result<RemoveItemResponse, ApiError>;

    /// `POST /checkout`, no body.
    async fn checkout(&self) -> Result<CheckoutResponse, ApiError>;
}

/// reqwest-backed [`Storefront`] implementation.
#[derive(Debug)]
pub struct StorefrontClient {
    client: Client,
    base: Url,
    csrf_token: String,
}

impl StorefrontClient {
    /// Create a client for the given shop origin and CSRF token.
    pub fn new(base_url: &str, csrf_token: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base,
            csrf_token: csrf_token.to_string(),
        })
    }

    /// The shop origin this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an endpoint path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::BaseUrl {
            url: format!("{}{path}", self.base),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Storefront for StorefrontClient {
    async fn cart_count(&self) -> Result<CartCountResponse, ApiError> {
        let url = self.endpoint("/cart_count")?;
        debug!(%url, "fetching cart count");
        let resp = self.client.get(url).send().await?;
        Ok(resp.json().await?)
    }

    async fn add_to_cart(&self, id: i64) -> Result<AddToCartResponse, ApiError> {
        let url = self.endpoint("/add_to_cart")?;
        debug!(%url, id, "adding item to cart");
        let resp = self
            .client
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .json(&serde_json::json!({ "id": id }))
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    async fn update_cart(
        &self,
        id: &str,
        action: QtyAction,
    ) -> Result<UpdateCartResponse, ApiError> {
        let url = self.endpoint("/update_cart")?;
        debug!(%url, id, ?action, "adjusting item quantity");
        let resp = self
            .client
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .json(&serde_json::json!({ "id": id, "action": action }))
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    async fn remove_item(&self, id: &str) -> Result<RemoveItemResponse, ApiError> {
        let url = self.endpoint("/remove_item")?;
        debug!(%url, id, "removing item from cart");
        let resp = self
            .client
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .json(&serde_json::json!({ "id": id }))
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    async fn checkout(&self) -> Result<CheckoutResponse, ApiError> {
        let url = self.endpoint("/checkout")?;
        debug!(%url, "starting checkout");
        // No body; the server only checks the session cart.
        let resp = self
            .client
            .post(url)
            .header(CSRF_HEADER, &self.csrf_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Ok(resp.json().await?)
    }
}
