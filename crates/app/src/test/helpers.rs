//! Test Helpers

use rust_decimal::Decimal;

use pawcart::{CartItemId, CartItemRecord, ProductId};

use crate::{gateway::GatewayError, notify::MockNotifier};

pub(crate) fn id(raw: u64) -> CartItemId {
    CartItemId::from_raw(raw)
}

/// Listing record with the price given in cents.
pub(crate) fn record(raw: u64, cents: i64, quantity: u32, selected: bool) -> CartItemRecord {
    CartItemRecord {
        id: id(raw),
        product_id: ProductId::from_raw(raw.saturating_add(100)),
        price: Some(Decimal::new(cents, 2)),
        quantity: Some(quantity),
        selected: Some(selected),
        name: Some(format!("product {raw}")),
        image: None,
    }
}

pub(crate) fn failure() -> GatewayError {
    GatewayError::UnexpectedStatus {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

/// Notifier that accepts any number of toasts.
pub(crate) fn quiet_notifier() -> MockNotifier {
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().return_const(());

    notifier
}
