//! Pawcart
//!
//! Cart and coupon domain types for the pet-care shop client: the cart
//! aggregate with its derived totals, coupon records with their status
//! lifecycle, and the decimal pricing rules shared by both.

pub mod cart;
pub mod coupons;
pub mod ids;
pub mod items;
mod lenient;
pub mod pricing;

pub use cart::Cart;
pub use coupons::{Coupon, CouponStatus, StatusFilter};
pub use ids::{CouponId, TypedId};
pub use items::{CartItem, CartItemId, CartItemRecord, ProductId, QuantityStep};
