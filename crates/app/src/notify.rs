//! Notification side-channel for non-blocking toasts.

use mockall::automock;
use tracing::{info, warn};

/// Kind of toast shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// An operation completed
    Success,

    /// An operation failed; local state is kept
    Failure,
}

/// Receives toasts from the cart and coupon layers.
#[automock]
pub trait Notifier: Send + Sync {
    /// Show a toast.
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Notifier that records toasts as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => info!(target: "pawcart::notice", "{message}"),
            NoticeKind::Failure => warn!(target: "pawcart::notice", "{message}"),
        }
    }
}

/// Toast texts.
pub mod messages {
    /// Shown when a line's selection or quantity failed to sync.
    pub const UPDATE_FAILED: &str = "update failed";

    /// Shown when the cart listing failed.
    pub const LOAD_FAILED: &str = "failed to load cart";

    /// Shown after a successful delete.
    pub const DELETED: &str = "deleted";

    /// Shown when one or more deletes failed.
    pub const DELETE_FAILED: &str = "delete failed";

    /// Shown after a successful clear.
    pub const CLEARED: &str = "cart cleared";

    /// Shown when the clear call failed.
    pub const CLEAR_FAILED: &str = "clear failed";

    /// Shown when checkout is attempted with nothing selected.
    pub const NOTHING_SELECTED: &str = "select items to check out";

    /// Shown after receiving a coupon, whatever the backend said.
    pub const COUPON_RECEIVED: &str = "coupon received";

    /// Shown when receiving a coupon requires signing in first.
    pub const LOGIN_REQUIRED: &str = "sign in to receive coupons";
}
