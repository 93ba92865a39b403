//! Coupons

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ids::CouponId, lenient};

/// Stored coupon status.
///
/// `available -> used` is the only transition; `expired` is whatever the
/// server reports, while local expiry is evaluated from `expire_time`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    /// Received and not yet redeemed
    #[default]
    Available,

    /// Redeemed against an order
    Used,

    /// Past its expiry date
    Expired,
}

impl CouponStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

impl Display for CouponStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.pad(self.as_str())
    }
}

/// Unknown status or filter name.
#[derive(Debug, Error, PartialEq)]
#[error("unknown coupon status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for CouponStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "available" => Ok(Self::Available),
            "used" => Ok(Self::Used),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Status filter for coupon lists; `All` passes everything through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// No filtering
    #[default]
    All,

    /// Only coupons with the given status
    Only(CouponStatus),
}

impl StatusFilter {
    /// Check whether a status passes the filter.
    pub fn matches(self, status: CouponStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }

    /// Query-string value understood by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

impl From<Option<CouponStatus>> for StatusFilter {
    fn from(status: Option<CouponStatus>) -> Self {
        status.map_or(Self::All, Self::Only)
    }
}

/// Coupon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Identity; the same id from the server and the mirror is one coupon.
    pub id: CouponId,

    /// Display name
    pub name: String,

    /// Discount granted
    pub amount: Decimal,

    /// Minimum selected total the coupon applies to
    #[serde(alias = "min_amount")]
    pub min_amount: Decimal,

    /// Last day the coupon can be used; `None` never expires
    #[serde(
        default,
        alias = "expire_time",
        deserialize_with = "lenient::date",
        skip_serializing_if = "Option::is_none"
    )]
    pub expire_time: Option<Date>,

    /// Stored status
    #[serde(default)]
    pub status: CouponStatus,

    /// When the coupon was received locally
    #[serde(
        default,
        alias = "received_at",
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub received_at: Option<Timestamp>,

    /// Server-side "already received" flag on promotion listings
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub received: Option<bool>,
}

impl Coupon {
    /// Check whether the coupon is past its expiry date on `today`.
    pub fn is_expired(&self, today: Date) -> bool {
        self.expire_time.is_some_and(|expiry| expiry < today)
    }

    /// Check whether the coupon can be redeemed on `today`.
    pub fn is_usable(&self, today: Date) -> bool {
        self.status == CouponStatus::Available && !self.is_expired(today)
    }

    /// Discount for a selected total: the full amount when usable and the
    /// total reaches the minimum, otherwise zero.
    pub fn discount_for(&self, subtotal: Decimal, today: Date) -> Decimal {
        if self.is_usable(today) && subtotal >= self.min_amount {
            self.amount
        } else {
            Decimal::ZERO
        }
    }

    /// Apply the `available -> used` transition.
    ///
    /// Returns `false` when the coupon was not available.
    pub fn mark_used(&mut self) -> bool {
        if self.status != CouponStatus::Available {
            return false;
        }

        self.status = CouponStatus::Used;

        true
    }

    /// Local copy of this coupon as received at `now`.
    #[must_use]
    pub fn received_copy(&self, now: Timestamp) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            amount: self.amount,
            min_amount: self.min_amount,
            expire_time: self.expire_time,
            status: CouponStatus::Available,
            received_at: Some(now),
            received: None,
        }
    }
}

/// Keep only coupons passing `filter`; `All` returns the input unchanged.
pub fn filter_by_status(coupons: Vec<Coupon>, filter: StatusFilter) -> Vec<Coupon> {
    match filter {
        StatusFilter::All => coupons,
        StatusFilter::Only(_) => coupons
            .into_iter()
            .filter(|coupon| filter.matches(coupon.status))
            .collect(),
    }
}

/// Drop repeated ids, keeping the first occurrence and the input order.
pub fn dedup_by_id(coupons: Vec<Coupon>) -> Vec<Coupon> {
    let mut seen = FxHashSet::default();

    coupons
        .into_iter()
        .filter(|coupon| seen.insert(coupon.id.clone()))
        .collect()
}

/// Ids present in a coupon list.
pub fn id_set(coupons: &[Coupon]) -> FxHashSet<CouponId> {
    coupons.iter().map(|coupon| coupon.id.clone()).collect()
}
