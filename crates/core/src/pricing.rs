//! Prices

use rust_decimal::{Decimal, RoundingStrategy};

use crate::items::CartItem;

/// Number of fractional digits used for every displayed amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Round an amount to cents, halves away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two fractional digits, e.g. `"20.00"`.
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = round_amount(amount);
    amount.rescale(AMOUNT_SCALE);

    amount.to_string()
}

/// Sums `price * quantity` over the selected items, rounded to cents.
pub fn selected_total<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> Decimal {
    let total = items
        .into_iter()
        .filter(|item| item.selected)
        .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total()));

    round_amount(total)
}
