//! Typed Ids

use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

/// Numeric server id tagged with the entity it identifies.
pub struct TypedId<T>(u64, PhantomData<T>);

impl<T> TypedId<T> {
    /// Wrap a raw server id.
    pub const fn from_raw(id: u64) -> Self {
        Self(id, PhantomData)
    }

    /// Returns the raw server id.
    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

impl<T> Clone for TypedId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedId<T> {}

impl<T> Debug for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedId<T> {}

impl<T> Hash for TypedId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<u64> for TypedId<T> {
    fn from(value: u64) -> Self {
        Self::from_raw(value)
    }
}

impl<T> FromStr for TypedId<T> {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self::from_raw)
    }
}

impl<T> Serialize for TypedId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de, T> Deserialize<'de> for TypedId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(RawIdVisitor)
            .map(Self::from_raw)
    }
}

/// Accepts ids sent either as JSON numbers or numeric strings.
struct RawIdVisitor;

impl Visitor<'_> for RawIdVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer id")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        v.trim().parse().map_err(E::custom)
    }
}

/// Coupon identity.
///
/// The backend sends numeric ids while locally received coupons may carry
/// string ids, so both forms normalise to the same textual identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CouponId(String);

impl CouponId {
    /// Create a coupon id from any textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the textual id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CouponId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for CouponId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for CouponId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for CouponId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CouponId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CouponIdVisitor)
    }
}

struct CouponIdVisitor;

impl Visitor<'_> for CouponIdVisitor {
    type Value = CouponId;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a coupon id string or integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CouponId, E> {
        Ok(CouponId::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CouponId, E> {
        Ok(CouponId(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CouponId, E> {
        Ok(CouponId::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<CouponId, E> {
        Ok(CouponId(v))
    }
}
