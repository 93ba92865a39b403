//! Cart Items

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ids::TypedId, lenient};

/// Product marker for [`ProductId`].
#[derive(Debug)]
pub struct Product;

/// Cart item id
pub type CartItemId = TypedId<CartItem>;

/// Product id
pub type ProductId = TypedId<Product>;

/// A cart line as returned by the cart listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRecord {
    /// Cart line id
    pub id: CartItemId,

    /// Product in the line
    #[serde(alias = "product_id")]
    pub product_id: ProductId,

    /// Unit price; missing when the product has since been removed.
    #[serde(default)]
    pub price: Option<Decimal>,

    /// Quantity; missing or zero normalises to one.
    #[serde(default)]
    pub quantity: Option<u32>,

    /// Selection flag; missing normalises to unselected.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub selected: Option<bool>,

    /// Product display name
    #[serde(default)]
    pub name: Option<String>,

    /// Product image URL
    #[serde(default)]
    pub image: Option<String>,
}

/// A normalised cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Cart line id
    pub id: CartItemId,

    /// Product in the line
    pub product_id: ProductId,

    /// Unit price
    pub price: Decimal,

    /// Number of units, never below one
    pub quantity: NonZeroU32,

    /// Whether the line counts toward the total and checkout
    pub selected: bool,

    /// Product display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Product image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    /// Returns `price * quantity`.
    pub fn line_total(&self) -> Decimal {
        self.price
            .saturating_mul(Decimal::from(self.quantity.get()))
    }
}

impl From<CartItemRecord> for CartItem {
    fn from(record: CartItemRecord) -> Self {
        Self {
            id: record.id,
            product_id: record.product_id,
            price: record.price.unwrap_or(Decimal::ZERO),
            quantity: record
                .quantity
                .and_then(NonZeroU32::new)
                .unwrap_or(NonZeroU32::MIN),
            selected: record.selected.unwrap_or(false),
            name: record.name,
            image: record.image,
        }
    }
}

/// A single-unit quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityStep {
    /// Add one unit
    Increase,

    /// Remove one unit, never going below one
    Decrease,
}

impl QuantityStep {
    /// Apply the step, returning `None` when the quantity cannot move.
    pub fn apply(self, quantity: NonZeroU32) -> Option<NonZeroU32> {
        match self {
            Self::Increase => quantity.checked_add(1),
            Self::Decrease => NonZeroU32::new(quantity.get() - 1),
        }
    }
}
