//! Cart session.
//!
//! Every mutation lands on the in-memory [`Cart`] first. Single-line changes
//! are then mirrored to the backend by a detached task per line; a failed sync
//! keeps the local state and only raises a toast. Batch operations wait for
//! every remote call, then reload so the cart shows server truth.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    num::NonZeroU32,
    sync::Arc,
};

use futures_util::future::join_all;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use pawcart::{Cart, CartItem, CartItemId, QuantityStep};

use crate::{
    domain::carts::{
        checkout::{CheckoutSnapshot, write_checkout_snapshot},
        errors::CheckoutError,
    },
    gateway::{CartGateway, CartItemPatch},
    mirror::MirrorStore,
    notify::{NoticeKind, Notifier, messages},
};

/// Combined result of an operation that deletes lines remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Nothing matched, so nothing was sent.
    Skipped,

    /// Every remote call succeeded.
    Confirmed,

    /// At least one remote call failed; the listed lines may still exist.
    Failed {
        /// Lines whose remote delete failed
        failed: Vec<CartItemId>,
    },
}

impl BatchOutcome {
    /// Check whether every remote call succeeded.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// A cart owned by one page or session, with its remote collaborators.
pub struct CartSession {
    cart: Cart,
    gateway: Arc<dyn CartGateway>,
    mirror: Arc<dyn MirrorStore>,
    notifier: Arc<dyn Notifier>,
    pending: JoinSet<()>,
}

impl CartSession {
    /// Create a session with an empty cart.
    pub fn new(
        gateway: Arc<dyn CartGateway>,
        mirror: Arc<dyn MirrorStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cart: Cart::new(),
            gateway,
            mirror,
            notifier,
            pending: JoinSet::new(),
        }
    }

    /// Current cart state.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Number of remote syncs not yet reaped; finished syncs are dropped on
    /// the next mutation.
    pub fn pending_syncs(&self) -> usize {
        self.pending.len()
    }

    /// Replace the cart with the server's listing.
    ///
    /// A failed listing empties the cart rather than keeping stale lines.
    pub async fn load(&mut self) -> &Cart {
        self.cart = match self.gateway.list_items().await {
            Ok(records) => {
                debug!(count = records.len(), "cart loaded");
                Cart::load(records)
            }
            Err(error) => {
                error!(%error, "failed to load cart");
                self.notifier
                    .notify(NoticeKind::Failure, messages::LOAD_FAILED);
                Cart::new()
            }
        };

        &self.cart
    }

    /// Flip one line's selection and sync it in the background.
    ///
    /// Unknown ids are ignored and nothing is sent.
    pub fn toggle_select(&mut self, item: CartItemId) -> Option<bool> {
        let selected = self.cart.toggle_select(item)?;

        self.sync(item, CartItemPatch::Selected(selected));

        Some(selected)
    }

    /// Toggle the aggregate selection and sync every line independently.
    pub fn select_all(&mut self) -> bool {
        let selected = self.cart.select_all();

        let ids: Vec<_> = self.cart.items().iter().map(|item| item.id).collect();

        for item in ids {
            self.sync(item, CartItemPatch::Selected(selected));
        }

        selected
    }

    /// Move one line's quantity by one unit and sync it in the background.
    ///
    /// Unknown ids and decreases at quantity one are no-ops and send nothing.
    pub fn change_quantity(&mut self, item: CartItemId, step: QuantityStep) -> Option<NonZeroU32> {
        let quantity = self.cart.set_quantity(item, step)?;

        self.sync(item, CartItemPatch::Quantity(quantity));

        Some(quantity)
    }

    /// Remove one line, delete it remotely, then reload.
    pub async fn remove_item(&mut self, item: CartItemId) -> BatchOutcome {
        if self.cart.remove_item(item).is_none() {
            return BatchOutcome::Skipped;
        }

        let outcome = match self.gateway.delete_item(item).await {
            Ok(()) => BatchOutcome::Confirmed,
            Err(error) => {
                warn!(%item, %error, "cart item delete failed");
                BatchOutcome::Failed { failed: vec![item] }
            }
        };

        self.finish_batch(&outcome, messages::DELETED, messages::DELETE_FAILED)
            .await;

        outcome
    }

    /// Remove every selected line with one concurrent delete per line.
    ///
    /// The outcome is confirmed only when every delete succeeds. The cart is
    /// reloaded either way.
    pub async fn remove_selected(&mut self) -> BatchOutcome {
        let removed = self.cart.remove_selected();

        if removed.is_empty() {
            return BatchOutcome::Skipped;
        }

        let deletes = removed.iter().map(|line| {
            let gateway = Arc::clone(&self.gateway);
            let item = line.id;

            async move { (item, gateway.delete_item(item).await) }
        });

        let failed: Vec<_> = join_all(deletes)
            .await
            .into_iter()
            .filter_map(|(item, result)| match result {
                Ok(()) => None,
                Err(error) => {
                    warn!(%item, %error, "cart item delete failed");
                    Some(item)
                }
            })
            .collect();

        let outcome = if failed.is_empty() {
            BatchOutcome::Confirmed
        } else {
            BatchOutcome::Failed { failed }
        };

        self.finish_batch(&outcome, messages::DELETED, messages::DELETE_FAILED)
            .await;

        outcome
    }

    /// Empty the cart with one bulk remote call, then reload.
    pub async fn clear(&mut self) -> BatchOutcome {
        let removed = self.cart.clear();

        let outcome = match self.gateway.clear().await {
            Ok(()) => BatchOutcome::Confirmed,
            Err(error) => {
                warn!(%error, "cart clear failed");
                BatchOutcome::Failed {
                    failed: removed.iter().map(|item| item.id).collect(),
                }
            }
        };

        self.finish_batch(&outcome, messages::CLEARED, messages::CLEAR_FAILED)
            .await;

        outcome
    }

    /// Capture the selected lines for the order-creation collaborator.
    ///
    /// The snapshot is a copy; later cart mutations do not touch it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NothingSelected`] when no line is selected.
    pub async fn checkout(&self) -> Result<CheckoutSnapshot, CheckoutError> {
        let items: Vec<CartItem> = self.cart.selected_items().cloned().collect();

        if items.is_empty() {
            self.notifier
                .notify(NoticeKind::Failure, messages::NOTHING_SELECTED);

            return Err(CheckoutError::NothingSelected);
        }

        let snapshot = CheckoutSnapshot::new(items);

        if let Err(error) = write_checkout_snapshot(self.mirror.as_ref(), &snapshot).await {
            warn!(%error, "failed to write checkout handoff");
        }

        info!(
            items = snapshot.items.len(),
            total = %snapshot.total_display(),
            "checkout captured"
        );

        Ok(snapshot)
    }

    /// Wait for every in-flight sync to finish.
    pub async fn settle(&mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(error) = result {
                error!(%error, "cart sync task did not complete");
            }
        }
    }

    async fn finish_batch(&mut self, outcome: &BatchOutcome, success: &str, failure: &str) {
        match outcome {
            BatchOutcome::Confirmed => self.notifier.notify(NoticeKind::Success, success),
            BatchOutcome::Failed { failed } => {
                warn!(failed = failed.len(), "batch cart operation failed");
                self.notifier.notify(NoticeKind::Failure, failure);
            }
            BatchOutcome::Skipped => {}
        }

        self.load().await;
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.pending.try_join_next() {
            if let Err(error) = result {
                error!(%error, "cart sync task did not complete");
            }
        }
    }

    fn sync(&mut self, item: CartItemId, patch: CartItemPatch) {
        self.reap_finished();

        let gateway = Arc::clone(&self.gateway);
        let notifier = Arc::clone(&self.notifier);

        self.pending.spawn(async move {
            match gateway.update_item(item, patch).await {
                Ok(()) => debug!(%item, ?patch, "cart item synced"),
                Err(error) => {
                    warn!(%item, ?patch, %error, "cart item sync failed");
                    notifier.notify(NoticeKind::Failure, messages::UPDATE_FAILED);
                }
            }
        });
    }
}

impl Debug for CartSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CartSession")
            .field("cart", &self.cart)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Drop for CartSession {
    fn drop(&mut self) {
        // In-flight syncs may still finish; their results only ever raise toasts.
        self.pending.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use pawcart::QuantityStep;

    use crate::{
        domain::carts::checkout::read_checkout_snapshot,
        gateway::MockCartGateway,
        mirror::InMemoryMirror,
        notify::MockNotifier,
        test::helpers::{failure, id, quiet_notifier, record},
    };

    use super::*;

    fn session(gateway: MockCartGateway, notifier: MockNotifier) -> CartSession {
        CartSession::new(
            Arc::new(gateway),
            Arc::new(InMemoryMirror::new()),
            Arc::new(notifier),
        )
    }

    async fn loaded(
        mut gateway: MockCartGateway,
        notifier: MockNotifier,
        records: Vec<pawcart::CartItemRecord>,
    ) -> CartSession {
        gateway
            .expect_list_items()
            .once()
            .return_once(move || Ok(records));

        let mut session = session(gateway, notifier);
        session.load().await;

        session
    }

    #[tokio::test]
    async fn load_builds_cart_from_listing() {
        let gateway = MockCartGateway::new();

        let session = loaded(
            gateway,
            quiet_notifier(),
            vec![record(1, 10_00, 2, true), record(2, 5_00, 1, false)],
        )
        .await;

        assert_eq!(session.cart().total_display(), "20.00");
        assert_eq!(session.cart().selected_count(), 1);
        assert!(!session.cart().all_selected(), "one line is unselected");
    }

    #[tokio::test]
    async fn load_failure_empties_cart_and_notifies() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(1, 1_00, 1, true)]));
        gateway
            .expect_list_items()
            .once()
            .returning(|| Err(failure()));

        notifier
            .expect_notify()
            .once()
            .withf(|kind, message| {
                *kind == NoticeKind::Failure && message == messages::LOAD_FAILED
            })
            .return_const(());

        let mut session = session(gateway, notifier);

        session.load().await;
        assert_eq!(session.cart().len(), 1);

        session.load().await;
        assert!(session.cart().is_empty(), "failed load resets to empty");
    }

    #[tokio::test]
    async fn toggle_applies_locally_and_syncs_that_line() {
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_update_item()
            .once()
            .withf(|item, patch| *item == id(2) && *patch == CartItemPatch::Selected(true))
            .returning(|_, _| Ok(()));

        let mut session = loaded(
            gateway,
            quiet_notifier(),
            vec![record(1, 10_00, 2, true), record(2, 5_00, 1, false)],
        )
        .await;

        assert_eq!(session.toggle_select(id(2)), Some(true));
        assert_eq!(session.cart().total_display(), "25.00");
        assert!(session.cart().all_selected(), "applied before any response");

        session.settle().await;
    }

    #[tokio::test]
    async fn toggle_unknown_line_sends_nothing() {
        let mut gateway = MockCartGateway::new();
        gateway.expect_update_item().never();

        let mut session = loaded(gateway, quiet_notifier(), vec![record(1, 1_00, 1, true)]).await;

        assert_eq!(session.toggle_select(id(9)), None);
        assert_eq!(session.pending_syncs(), 0);
    }

    #[tokio::test]
    async fn failed_sync_keeps_local_state_and_notifies() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_update_item()
            .once()
            .returning(|_, _| Err(failure()));

        notifier
            .expect_notify()
            .once()
            .withf(|kind, message| {
                *kind == NoticeKind::Failure && message == messages::UPDATE_FAILED
            })
            .return_const(());

        let mut session = loaded(gateway, notifier, vec![record(1, 4_00, 1, true)]).await;

        session.change_quantity(id(1), QuantityStep::Increase);
        session.settle().await;

        assert_eq!(
            session.cart().get(id(1)).map(|item| item.quantity.get()),
            Some(2),
            "no rollback after a failed sync"
        );
        assert_eq!(session.cart().total_display(), "8.00");
    }

    #[tokio::test]
    async fn one_failed_line_does_not_affect_others() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_update_item()
            .times(3)
            .returning(|item, _| {
                if item == id(2) {
                    Err(failure())
                } else {
                    Ok(())
                }
            });

        notifier.expect_notify().once().return_const(());

        let mut session = loaded(
            gateway,
            notifier,
            vec![
                record(1, 1_00, 1, false),
                record(2, 1_00, 1, true),
                record(3, 1_00, 1, false),
            ],
        )
        .await;

        assert!(session.select_all(), "partial selection selects everything");
        assert_eq!(session.pending_syncs(), 3);

        session.settle().await;

        assert!(session.cart().all_selected(), "every line stays selected");
        assert_eq!(session.cart().total_display(), "3.00");
    }

    #[tokio::test]
    async fn finished_syncs_are_reaped_before_new_ones() {
        let mut gateway = MockCartGateway::new();
        gateway.expect_update_item().returning(|_, _| Ok(()));

        let mut session = loaded(gateway, quiet_notifier(), vec![record(1, 1_00, 1, true)]).await;

        for _ in 0..1_000 {
            session.toggle_select(id(1));
        }

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        session.toggle_select(id(1));

        assert!(
            session.pending_syncs() < 10,
            "finished syncs linger: {}",
            session.pending_syncs()
        );
        assert_eq!(session.cart().selected_count(), 0, "odd number of toggles");

        session.settle().await;
    }

    #[tokio::test]
    async fn decrease_at_one_sends_nothing() {
        let mut gateway = MockCartGateway::new();
        gateway.expect_update_item().never();

        let mut session = loaded(gateway, quiet_notifier(), vec![record(1, 1_00, 1, true)]).await;

        assert_eq!(session.change_quantity(id(1), QuantityStep::Decrease), None);
        assert_eq!(session.pending_syncs(), 0);
    }

    #[tokio::test]
    async fn quantity_changes_sync_the_new_quantity() {
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_update_item()
            .once()
            .withf(|item, patch| {
                *item == id(1) && *patch == CartItemPatch::Quantity(NonZeroU32::MIN.saturating_add(1))
            })
            .returning(|_, _| Ok(()));

        let mut session = loaded(gateway, quiet_notifier(), vec![record(1, 1_50, 1, true)]).await;

        session.change_quantity(id(1), QuantityStep::Increase);
        session.settle().await;

        assert_eq!(session.cart().total_display(), "3.00");
    }

    #[tokio::test]
    async fn remove_selected_partial_failure_reports_failure_and_reloads() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_list_items()
            .once()
            .returning(|| {
                Ok(vec![
                    record(1, 1_00, 1, true),
                    record(2, 2_00, 1, true),
                    record(3, 3_00, 1, true),
                    record(4, 4_00, 1, false),
                ])
            });

        gateway
            .expect_delete_item()
            .times(3)
            .returning(|item| if item == id(2) { Err(failure()) } else { Ok(()) });

        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(2, 2_00, 1, true), record(4, 4_00, 1, false)]));

        notifier
            .expect_notify()
            .once()
            .withf(|kind, message| {
                *kind == NoticeKind::Failure && message == messages::DELETE_FAILED
            })
            .return_const(());

        let mut session = session(gateway, notifier);
        session.load().await;

        let outcome = session.remove_selected().await;

        assert_eq!(outcome, BatchOutcome::Failed { failed: vec![id(2)] });

        let remaining: Vec<_> = session.cart().items().iter().map(|item| item.id).collect();

        assert_eq!(remaining, [id(2), id(4)], "failed delete reappears after reload");
    }

    #[tokio::test]
    async fn remove_selected_success_notifies_once() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(1, 1_00, 1, true), record(2, 2_00, 1, true)]));
        gateway.expect_delete_item().times(2).returning(|_| Ok(()));
        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(Vec::new()));

        notifier
            .expect_notify()
            .once()
            .withf(|kind, message| *kind == NoticeKind::Success && message == messages::DELETED)
            .return_const(());

        let mut session = session(gateway, notifier);
        session.load().await;

        assert!(session.remove_selected().await.is_confirmed());
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn remove_selected_with_nothing_selected_is_skipped() {
        let mut gateway = MockCartGateway::new();
        gateway.expect_delete_item().never();

        let mut session = loaded(gateway, quiet_notifier(), vec![record(1, 1_00, 1, false)]).await;

        assert_eq!(session.remove_selected().await, BatchOutcome::Skipped);
        assert_eq!(session.cart().len(), 1);
    }

    #[tokio::test]
    async fn remove_item_deletes_and_reloads() {
        let mut gateway = MockCartGateway::new();

        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(1, 1_00, 1, true), record(2, 2_00, 1, true)]));
        gateway
            .expect_delete_item()
            .once()
            .withf(|item| *item == id(1))
            .returning(|_| Ok(()));
        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(2, 2_00, 1, true)]));

        let mut session = session(gateway, quiet_notifier());
        session.load().await;

        assert!(session.remove_item(id(1)).await.is_confirmed());
        assert_eq!(session.cart().len(), 1);
        assert_eq!(session.cart().total_display(), "2.00");
    }

    #[tokio::test]
    async fn clear_failure_reloads_server_state() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_list_items()
            .times(2)
            .returning(|| Ok(vec![record(1, 1_00, 1, true)]));
        gateway.expect_clear().once().returning(|| Err(failure()));

        notifier
            .expect_notify()
            .once()
            .withf(|kind, message| {
                *kind == NoticeKind::Failure && message == messages::CLEAR_FAILED
            })
            .return_const(());

        let mut session = session(gateway, notifier);
        session.load().await;

        let outcome = session.clear().await;

        assert_eq!(outcome, BatchOutcome::Failed { failed: vec![id(1)] });
        assert_eq!(session.cart().len(), 1, "server still has the line");
    }

    #[tokio::test]
    async fn checkout_snapshot_is_not_affected_by_later_mutations() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway.expect_update_item().returning(|_, _| Ok(()));
        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(1, 10_00, 2, true), record(2, 5_00, 1, false)]));

        let mirror = InMemoryMirror::new();
        let mut session = CartSession::new(
            Arc::new(gateway),
            Arc::new(mirror.clone()),
            Arc::new(quiet_notifier()),
        );
        session.load().await;

        let snapshot = session.checkout().await?;

        session.toggle_select(id(2));
        session.change_quantity(id(1), QuantityStep::Increase);
        session.settle().await;

        let handed_off = read_checkout_snapshot(&mirror).await;
        let ids: Vec<_> = handed_off.iter().map(|item| item.id).collect();

        assert_eq!(ids, [id(1)]);
        assert_eq!(handed_off, snapshot.items);
        assert_eq!(
            handed_off.first().map(|item| item.quantity.get()),
            Some(2),
            "snapshot keeps the quantity at capture time"
        );
        assert_eq!(snapshot.total_display(), "20.00");

        Ok(())
    }

    #[tokio::test]
    async fn checkout_with_nothing_selected_fails_and_writes_nothing() {
        let mut gateway = MockCartGateway::new();
        let mut notifier = MockNotifier::new();

        gateway
            .expect_list_items()
            .once()
            .returning(|| Ok(vec![record(1, 1_00, 1, false)]));

        notifier
            .expect_notify()
            .once()
            .withf(|_, message| message == messages::NOTHING_SELECTED)
            .return_const(());

        let mirror = InMemoryMirror::new();
        let mut session =
            CartSession::new(Arc::new(gateway), Arc::new(mirror.clone()), Arc::new(notifier));
        session.load().await;

        let result = session.checkout().await;

        assert!(
            matches!(result, Err(CheckoutError::NothingSelected)),
            "expected NothingSelected, got {result:?}"
        );
        assert!(read_checkout_snapshot(&mirror).await.is_empty());
    }
}
