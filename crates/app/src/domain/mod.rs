//! Pawcart Domain Concerns

pub mod carts;
pub mod coupons;
