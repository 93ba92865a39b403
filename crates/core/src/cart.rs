//! Cart

use std::num::NonZeroU32;

use jiff::civil::Date;
use rust_decimal::Decimal;

use crate::{
    coupons::Coupon,
    items::{CartItem, CartItemId, CartItemRecord, QuantityStep},
    pricing::{format_amount, round_amount, selected_total},
};

/// Cart aggregate.
///
/// Items keep the order the server listed them in. `total_price`,
/// `selected_count` and `all_selected` are derived and recomputed after
/// every mutation; they are never set directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
    total_price: Decimal,
    selected_count: usize,
    all_selected: bool,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from listing records, normalising each one.
    pub fn load(records: impl IntoIterator<Item = CartItemRecord>) -> Self {
        Self::with_items(records.into_iter().map(CartItem::from).collect::<Vec<_>>())
    }

    /// Build a cart from already-normalised items.
    pub fn with_items(items: impl Into<Vec<CartItem>>) -> Self {
        let mut cart = Self {
            items: items.into(),
            ..Self::default()
        };

        cart.recompute();

        cart
    }

    /// Items in server order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up an item by id.
    pub fn get(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Selected items in server order.
    pub fn selected_items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|item| item.selected)
    }

    /// Number of lines in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over selected lines, rounded to cents.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// The total formatted with two fractional digits.
    pub fn total_display(&self) -> String {
        format_amount(self.total_price)
    }

    /// Number of selected lines, regardless of quantity.
    pub fn selected_count(&self) -> usize {
        self.selected_count
    }

    /// `true` when the cart is non-empty and every line is selected.
    pub fn all_selected(&self) -> bool {
        self.all_selected
    }

    /// Flip the selection of one line.
    ///
    /// Returns the new flag, or `None` when no line has that id.
    pub fn toggle_select(&mut self, id: CartItemId) -> Option<bool> {
        let item = self.item_mut(id)?;
        item.selected = !item.selected;
        let selected = item.selected;

        self.recompute();

        Some(selected)
    }

    /// Set every line's selection to the negation of `all_selected`.
    ///
    /// With three of five lines selected this selects all five, since the
    /// aggregate flag was `false`. Returns the flag applied to every line.
    pub fn select_all(&mut self) -> bool {
        let selected = !Self::every_selected(&self.items);

        for item in &mut self.items {
            item.selected = selected;
        }

        self.recompute();

        selected
    }

    /// Move one line's quantity by a single unit.
    ///
    /// Returns the new quantity, or `None` when the id is unknown or the
    /// quantity is already at its floor of one.
    pub fn set_quantity(&mut self, id: CartItemId, step: QuantityStep) -> Option<NonZeroU32> {
        let item = self.item_mut(id)?;
        let quantity = step.apply(item.quantity)?;
        item.quantity = quantity;

        self.recompute();

        Some(quantity)
    }

    /// Remove one line, returning it when present.
    pub fn remove_item(&mut self, id: CartItemId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(index);

        self.recompute();

        Some(removed)
    }

    /// Remove every selected line, returning them in server order.
    pub fn remove_selected(&mut self) -> Vec<CartItem> {
        let (removed, kept) = self.items.drain(..).partition(|item| item.selected);
        self.items = kept;

        self.recompute();

        removed
    }

    /// Remove every line.
    pub fn clear(&mut self) -> Vec<CartItem> {
        let removed = std::mem::take(&mut self.items);

        self.recompute();

        removed
    }

    /// The selected total after applying `coupon`, floored at zero.
    pub fn total_after(&self, coupon: &Coupon, today: Date) -> Decimal {
        let discount = coupon.discount_for(self.total_price, today);

        round_amount(self.total_price.saturating_sub(discount).max(Decimal::ZERO))
    }

    fn item_mut(&mut self, id: CartItemId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn every_selected(items: &[CartItem]) -> bool {
        !items.is_empty() && items.iter().all(|item| item.selected)
    }

    fn recompute(&mut self) {
        self.total_price = selected_total(&self.items);
        self.selected_count = self.items.iter().filter(|item| item.selected).count();
        self.all_selected = Self::every_selected(&self.items);
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil;
    use testresult::TestResult;

    use crate::coupons::CouponStatus;

    use super::*;

    fn record(id: u64, price_cents: i64, quantity: u32, selected: bool) -> CartItemRecord {
        CartItemRecord {
            id: CartItemId::from_raw(id),
            product_id: id.into(),
            price: Some(Decimal::new(price_cents, 2)),
            quantity: Some(quantity),
            selected: Some(selected),
            name: None,
            image: None,
        }
    }

    fn selections(cart: &Cart) -> Vec<bool> {
        cart.items().iter().map(|item| item.selected).collect()
    }

    fn id(raw: u64) -> CartItemId {
        CartItemId::from_raw(raw)
    }

    #[test]
    fn load_computes_derived_fields() {
        let cart = Cart::load([record(1, 10_00, 2, true), record(2, 5_00, 1, false)]);

        assert_eq!(cart.total_display(), "20.00");
        assert_eq!(cart.selected_count(), 1);
        assert!(!cart.all_selected(), "one line is unselected");
    }

    #[test]
    fn load_keeps_server_order() {
        let cart = Cart::load([record(9, 1_00, 1, false), record(3, 1_00, 1, false)]);

        let ids: Vec<_> = cart.items().iter().map(|item| item.id).collect();

        assert_eq!(ids, [id(9), id(3)]);
    }

    #[test]
    fn empty_cart_is_never_all_selected() {
        let cart = Cart::new();

        assert!(!cart.all_selected(), "empty cart cannot be all selected");
        assert_eq!(cart.total_display(), "0.00");
        assert_eq!(cart.selected_count(), 0);
    }

    #[test]
    fn nothing_selected_totals_zero() {
        let cart = Cart::load([record(1, 10_00, 2, false), record(2, 5_00, 1, false)]);

        assert_eq!(cart.total_price(), Decimal::ZERO);
        assert_eq!(cart.total_display(), "0.00");
    }

    #[test]
    fn selected_count_ignores_quantity() {
        let cart = Cart::load([record(1, 1_00, 3, true)]);

        assert_eq!(cart.selected_count(), 1);
        assert_eq!(cart.total_display(), "3.00");
    }

    #[test]
    fn toggle_select_flips_and_recomputes() {
        let mut cart = Cart::load([record(1, 10_00, 2, true), record(2, 5_00, 1, false)]);

        assert_eq!(cart.toggle_select(id(2)), Some(true));
        assert!(cart.all_selected(), "both lines now selected");
        assert_eq!(cart.total_display(), "25.00");
        assert_eq!(cart.selected_count(), 2);
    }

    #[test]
    fn toggle_select_unknown_id_is_silent() {
        let mut cart = Cart::load([record(1, 10_00, 2, true)]);
        let before = cart.clone();

        assert_eq!(cart.toggle_select(id(42)), None);
        assert_eq!(cart, before);
    }

    #[test]
    fn select_all_from_partial_selects_everything() {
        let mut cart = Cart::load([
            record(1, 1_00, 1, true),
            record(2, 1_00, 1, true),
            record(3, 1_00, 1, true),
            record(4, 1_00, 1, false),
            record(5, 1_00, 1, false),
        ]);

        assert!(cart.select_all(), "partial selection toggles to all");
        assert_eq!(selections(&cart), [true; 5]);
        assert!(cart.all_selected(), "every line selected");
        assert_eq!(cart.total_display(), "5.00");
    }

    #[test]
    fn select_all_from_all_selected_clears_everything() {
        let mut cart = Cart::load([record(1, 1_00, 1, true), record(2, 1_00, 1, true)]);

        assert!(!cart.select_all(), "all selected toggles to none");
        assert_eq!(selections(&cart), [false, false]);
        assert_eq!(cart.total_display(), "0.00");
    }

    #[test]
    fn select_all_twice_round_trips_at_fixed_points() {
        let all = [record(1, 1_00, 1, true), record(2, 1_00, 1, true)];
        let none = [record(1, 1_00, 1, false), record(2, 1_00, 1, false)];

        for records in [all, none] {
            let mut cart = Cart::load(records);
            let before = selections(&cart);

            cart.select_all();
            cart.select_all();

            assert_eq!(selections(&cart), before);
        }
    }

    #[test]
    fn select_all_twice_does_not_round_trip_from_partial() {
        let mut cart = Cart::load([record(1, 1_00, 1, true), record(2, 1_00, 1, false)]);

        cart.select_all();
        cart.select_all();

        assert_eq!(selections(&cart), [false, false]);
    }

    #[test]
    fn select_all_reads_fresh_state_after_toggles() {
        let mut cart = Cart::load([record(1, 1_00, 1, true), record(2, 1_00, 1, false)]);

        cart.toggle_select(id(2));

        assert!(!cart.select_all(), "toggle made every line selected first");
        assert_eq!(selections(&cart), [false, false]);
    }

    #[test]
    fn set_quantity_moves_one_unit() {
        let mut cart = Cart::load([record(1, 2_50, 1, true)]);

        assert_eq!(
            cart.set_quantity(id(1), QuantityStep::Increase).map(NonZeroU32::get),
            Some(2)
        );
        assert_eq!(cart.total_display(), "5.00");

        assert_eq!(
            cart.set_quantity(id(1), QuantityStep::Decrease).map(NonZeroU32::get),
            Some(1)
        );
        assert_eq!(cart.total_display(), "2.50");
    }

    #[test]
    fn set_quantity_clamps_at_one() {
        let mut cart = Cart::load([record(1, 2_50, 1, true)]);

        assert_eq!(cart.set_quantity(id(1), QuantityStep::Decrease), None);
        assert_eq!(cart.get(id(1)).map(|item| item.quantity.get()), Some(1));
    }

    #[test]
    fn set_quantity_unknown_id_is_silent() {
        let mut cart = Cart::load([record(1, 2_50, 1, true)]);

        assert_eq!(cart.set_quantity(id(2), QuantityStep::Increase), None);
        assert_eq!(cart.total_display(), "2.50");
    }

    #[test]
    fn remove_item_recomputes_all_selected() {
        let mut cart = Cart::load([record(1, 1_00, 1, true), record(2, 1_00, 1, false)]);

        let removed = cart.remove_item(id(2));

        assert_eq!(removed.map(|item| item.id), Some(id(2)));
        assert!(cart.all_selected(), "only a selected line remains");
    }

    #[test]
    fn remove_selected_keeps_unselected_in_order() {
        let mut cart = Cart::load([
            record(1, 1_00, 1, true),
            record(2, 2_00, 1, false),
            record(3, 3_00, 1, true),
            record(4, 4_00, 1, false),
        ]);

        let removed: Vec<_> = cart.remove_selected().into_iter().map(|item| item.id).collect();
        let kept: Vec<_> = cart.items().iter().map(|item| item.id).collect();

        assert_eq!(removed, [id(1), id(3)]);
        assert_eq!(kept, [id(2), id(4)]);
        assert_eq!(cart.total_display(), "0.00");
    }

    #[test]
    fn clear_empties_the_cart() {
        let mut cart = Cart::load([record(1, 1_00, 1, true), record(2, 2_00, 1, true)]);

        assert_eq!(cart.clear().len(), 2);
        assert!(cart.is_empty());
        assert!(!cart.all_selected(), "empty cart cannot be all selected");
        assert_eq!(cart.total_display(), "0.00");
    }

    #[test]
    fn totals_avoid_binary_float_drift() {
        let cart = Cart::load([record(1, 10, 1, true), record(2, 20, 1, true)]);

        assert_eq!(cart.total_display(), "0.30");
    }

    #[test]
    fn total_after_applies_eligible_coupon() -> TestResult {
        let cart = Cart::load([record(1, 60_00, 2, true)]);
        let coupon: Coupon = serde_json::from_str(
            r#"{"id": 2, "name": "100 off 20", "amount": 20, "minAmount": 100, "expireTime": "2030-12-31"}"#,
        )?;

        assert_eq!(coupon.status, CouponStatus::Available);
        assert_eq!(
            cart.total_after(&coupon, civil::date(2030, 1, 1)),
            Decimal::from(100)
        );

        Ok(())
    }

    #[test]
    fn total_after_ignores_coupon_below_minimum() -> TestResult {
        let cart = Cart::load([record(1, 10_00, 1, true)]);
        let coupon: Coupon = serde_json::from_str(
            r#"{"id": 2, "name": "100 off 20", "amount": 20, "minAmount": 100, "expireTime": "2030-12-31"}"#,
        )?;

        assert_eq!(
            cart.total_after(&coupon, civil::date(2030, 1, 1)),
            Decimal::from(10)
        );

        Ok(())
    }
}
