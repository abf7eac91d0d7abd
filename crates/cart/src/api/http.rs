//! HTTP client for the Cart and Catalog REST APIs.
//!
//! All endpoints wrap their payload in a `{ "data": ... }` envelope.
//! Catalog lookups are cached with `moka` (5-minute TTL); cart endpoints
//! are never cached - the cart is mutable state.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use zella_core::{Cart, Product, ProductRef};

use crate::api::{CartApi, ProductCatalog};
use crate::config::CartConfig;
use crate::error::CartError;

/// Transport-level retries (connect/timeout only). HTTP error statuses are
/// never retried here - the store surfaces them to the caller.
const MAX_TRANSPORT_RETRIES: u32 = 2;

const PRODUCT_CACHE_CAPACITY: u64 = 1000;
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Client for the Cart and Catalog APIs.
///
/// Implements both [`CartApi`] and [`ProductCatalog`]; one instance serves
/// both seams of the cart store.
#[derive(Clone)]
pub struct HttpCommerceClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    products: Cache<ProductRef, Product>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AddLineBody<'a> {
    product_id: &'a str,
    quantity: u32,
    size: &'a str,
}

#[derive(serde::Serialize)]
struct UpdateLineBody<'a> {
    quantity: u32,
    size: &'a str,
}

impl HttpCommerceClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &CartConfig) -> Result<Self, CartError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                token: config.api_token.clone(),
                products,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Send a request, retrying connect/timeout failures.
    ///
    /// The builder closure is re-invoked per attempt since a
    /// `RequestBuilder` is consumed on send.
    async fn send(
        &self,
        build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CartError> {
        let mut attempt = 0;
        loop {
            let mut request = build(&self.inner.client);
            if let Some(token) = &self.inner.token {
                request = request.bearer_auth(token.expose_secret());
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(error)
                    if (error.is_timeout() || error.is_connect())
                        && attempt < MAX_TRANSPORT_RETRIES =>
                {
                    attempt += 1;
                    debug!(%error, attempt, "Transport error; retrying request");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CartError> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(CartError::Unauthorized);
        }
        if !status.is_success() {
            // Prefer the server's structured message when parseable
            let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |parsed| parsed.message,
            );
            return Err(CartError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

impl CartApi for HttpCommerceClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Cart, CartError> {
        let url = self.endpoint("cart");
        let response = self.send(|client| client.get(&url)).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(product = %product, size = %size))]
    async fn add_line(
        &self,
        product: &ProductRef,
        quantity: u32,
        size: &str,
    ) -> Result<Cart, CartError> {
        let url = self.endpoint("cart");
        let body = AddLineBody {
            product_id: product.as_str(),
            quantity,
            size,
        };
        let response = self.send(|client| client.post(&url).json(&body)).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(product = %product, size = %size))]
    async fn update_line(
        &self,
        product: &ProductRef,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let url = self.endpoint(&format!("cart/{product}"));
        let body = UpdateLineBody { quantity, size };
        let response = self.send(|client| client.put(&url).json(&body)).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(product = %product, size = %size))]
    async fn remove_line(&self, product: &ProductRef, size: &str) -> Result<Cart, CartError> {
        let url = self.endpoint(&format!("cart/{product}"));
        let response = self
            .send(|client| client.delete(&url).query(&[("size", size)]))
            .await?;
        Self::decode(response).await
    }
}

impl ProductCatalog for HttpCommerceClient {
    #[instrument(skip(self), fields(product = %id))]
    async fn product(&self, id: &ProductRef) -> Result<Product, CartError> {
        if let Some(product) = self.inner.products.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint(&format!("products/{id}"));
        let response = self.send(|client| client.get(&url)).await?;
        let product: Product = match Self::decode(response).await {
            Ok(product) => product,
            Err(CartError::Api { status: 404, .. }) => {
                return Err(CartError::ProductNotFound(id.clone()));
            }
            Err(error) => return Err(error),
        };

        self.inner
            .products
            .insert(id.clone(), product.clone())
            .await;

        Ok(product)
    }
}
