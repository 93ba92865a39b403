//! Remote gateway.
//!
//! Every call may succeed, fail or time out; callers decide what a failure
//! means. Transport timeouts belong to the implementation.

use std::num::NonZeroU32;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

use pawcart::{CartItemId, CartItemRecord, Coupon, CouponId, StatusFilter};

mod http;

pub use http::{HttpGateway, HttpGatewayConfig};

/// Partial update of a single cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartItemPatch {
    /// `{"selected": bool}`
    Selected(bool),

    /// `{"quantity": n}`
    Quantity(NonZeroU32),
}

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An HTTP transport, timeout or decoding error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-zero envelope code.
    #[error("backend rejected request with code {code}: {message}")]
    Rejected {
        /// Envelope code
        code: i64,

        /// Envelope message
        message: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,

        /// Response body or envelope message
        message: String,
    },
}

/// Cart endpoints of the backend.
#[automock]
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// List the cart's lines in server order.
    async fn list_items(&self) -> Result<Vec<CartItemRecord>, GatewayError>;

    /// Update one line with a partial field set.
    async fn update_item(&self, item: CartItemId, patch: CartItemPatch)
    -> Result<(), GatewayError>;

    /// Delete one line.
    async fn delete_item(&self, item: CartItemId) -> Result<(), GatewayError>;

    /// Delete every line in one call.
    async fn clear(&self) -> Result<(), GatewayError>;
}

/// Coupon endpoints of the backend.
#[automock]
#[async_trait]
pub trait CouponGateway: Send + Sync {
    /// List coupons on offer in the coupon center.
    async fn list_available(&self) -> Result<Vec<Coupon>, GatewayError>;

    /// List the user's own coupons.
    async fn list_mine(&self, filter: StatusFilter) -> Result<Vec<Coupon>, GatewayError>;

    /// Receive a coupon on offer.
    async fn receive(&self, coupon: CouponId) -> Result<(), GatewayError>;
}
