//! HTTP client for the shop backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use pawcart::{CartItemId, CartItemRecord, Coupon, CouponId, StatusFilter};

use super::{CartGateway, CartItemPatch, CouponGateway, GatewayError};

/// Configuration for connecting to the shop backend.
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// API base URL, e.g. `"http://127.0.0.1:5000/api"`.
    pub base_url: String,

    /// Bearer token; `None` sends unauthenticated requests.
    pub token: Option<String>,

    /// Transport timeout for each request.
    pub timeout: Duration,
}

/// REST gateway over the backend's `{code, message, data}` envelopes.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: HttpGatewayConfig,
    http: Client,
}

impl HttpGateway {
    /// Create a new gateway from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and unwrap the envelope's `data`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, GatewayError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(text);

            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<Envelope<T>>().await?.into_data()
    }

    async fn send_list<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, GatewayError> {
        Ok(self.send::<Vec<T>>(request).await?.unwrap_or_default())
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), GatewayError> {
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }
}

#[async_trait]
impl CartGateway for HttpGateway {
    async fn list_items(&self) -> Result<Vec<CartItemRecord>, GatewayError> {
        debug!("listing cart items");

        self.send_list(self.http.get(self.url("cart"))).await
    }

    async fn update_item(
        &self,
        item: CartItemId,
        patch: CartItemPatch,
    ) -> Result<(), GatewayError> {
        debug!(%item, ?patch, "updating cart item");

        self.send_unit(self.http.put(self.url(&format!("cart/{item}"))).json(&patch))
            .await
    }

    async fn delete_item(&self, item: CartItemId) -> Result<(), GatewayError> {
        debug!(%item, "deleting cart item");

        self.send_unit(self.http.delete(self.url(&format!("cart/{item}"))))
            .await
    }

    async fn clear(&self) -> Result<(), GatewayError> {
        debug!("clearing cart");

        self.send_unit(self.http.post(self.url("cart/clear"))).await
    }
}

#[async_trait]
impl CouponGateway for HttpGateway {
    async fn list_available(&self) -> Result<Vec<Coupon>, GatewayError> {
        debug!("listing coupons on offer");

        self.send_list(self.http.get(self.url("coupons/available")))
            .await
    }

    async fn list_mine(&self, filter: StatusFilter) -> Result<Vec<Coupon>, GatewayError> {
        debug!(status = filter.as_str(), "listing received coupons");

        let request = self
            .http
            .get(self.url("coupons/my"))
            .query(&[("status", filter.as_str())]);

        self.send_list(request).await
    }

    async fn receive(&self, coupon: CouponId) -> Result<(), GatewayError> {
        debug!(%coupon, "receiving coupon");

        self.send_unit(self.http.post(self.url(&format!("coupons/{coupon}/receive"))))
            .await
    }
}

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<Option<T>, GatewayError> {
        if self.code != 0 {
            return Err(GatewayError::Rejected {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        Ok(self.data)
    }
}
