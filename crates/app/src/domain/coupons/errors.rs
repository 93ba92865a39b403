//! Coupon errors.

use thiserror::Error;

use pawcart::CouponId;

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("sign in to receive coupons")]
    Unauthenticated,

    #[error("coupon {0} is not on offer")]
    NotOffered(CouponId),
}
