//! Checkout handoff.
//!
//! Checkout copies the selected lines into the mirror under
//! `selectedCartItems`, where the order-creation flow picks them up.

use rust_decimal::Decimal;

use pawcart::{CartItem, pricing};

use crate::mirror::{MirrorError, MirrorKey, MirrorStore, read_collection, write_collection};

/// Selected lines captured at checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSnapshot {
    /// Selected lines as they were at checkout
    pub items: Vec<CartItem>,
}

impl CheckoutSnapshot {
    pub(crate) fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Sum of the captured lines.
    pub fn total(&self) -> Decimal {
        pricing::selected_total(&self.items)
    }

    /// Captured total formatted with two decimals.
    pub fn total_display(&self) -> String {
        pricing::format_amount(self.total())
    }
}

pub(crate) async fn write_checkout_snapshot(
    store: &dyn MirrorStore,
    snapshot: &CheckoutSnapshot,
) -> Result<(), MirrorError> {
    write_collection(store, MirrorKey::SelectedCartItems, &snapshot.items).await
}

/// Read the last checkout handoff, empty when none was written.
pub async fn read_checkout_snapshot(store: &dyn MirrorStore) -> Vec<CartItem> {
    read_collection(store, MirrorKey::SelectedCartItems).await
}
