//! Coupon cache.
//!
//! The backend is authoritative whenever it returns coupons. The mirror under
//! `myCoupons` is only read when the backend fails or returns nothing, and is
//! never merged with a non-empty remote list.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use jiff::Timestamp;
use tracing::{debug, info, warn};

use pawcart::{
    Coupon, CouponId, StatusFilter,
    coupons::{dedup_by_id, filter_by_status, id_set},
};

use crate::{
    domain::coupons::errors::CouponError,
    gateway::{CouponGateway, GatewayError},
    mirror::{MirrorKey, MirrorStore, read_collection, try_read_collection, write_collection},
    notify::{NoticeKind, Notifier, messages},
};

/// A coupon on offer, annotated with whether the user already holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponOffer {
    /// Coupon as listed
    pub coupon: Coupon,

    /// Whether the backend or the mirror says the user holds it
    pub received: bool,
}

/// Coupon listings backed by the shop API, with the mirror as fallback.
#[derive(Clone)]
pub struct CouponCache {
    gateway: Arc<dyn CouponGateway>,
    mirror: Arc<dyn MirrorStore>,
    notifier: Arc<dyn Notifier>,
}

impl CouponCache {
    /// Create a cache over the given gateway and mirror.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn CouponGateway>,
        mirror: Arc<dyn MirrorStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            mirror,
            notifier,
        }
    }

    /// Coupons on offer, from the backend or else from the mirror.
    pub async fn fetch_available(&self) -> Vec<Coupon> {
        let remote = self.gateway.list_available().await;

        self.or_mirrored(remote, StatusFilter::All).await
    }

    /// The user's coupons passing `filter`, from the backend or else from the
    /// mirror filtered the same way.
    pub async fn fetch_mine(&self, filter: StatusFilter) -> Vec<Coupon> {
        let remote = self.gateway.list_mine(filter).await;

        self.or_mirrored(remote, filter).await
    }

    /// Locally received coupons, without duplicates.
    pub async fn mirrored(&self) -> Vec<Coupon> {
        dedup_by_id(read_collection(self.mirror.as_ref(), MirrorKey::MyCoupons).await)
    }

    /// Record `coupon` as received in the mirror.
    ///
    /// Returns `true` when an entry was written; a coupon already present is
    /// left untouched. An unreadable mirror is not overwritten.
    pub async fn mark_received(&self, coupon: &Coupon) -> bool {
        let mut held: Vec<Coupon> =
            match try_read_collection(self.mirror.as_ref(), MirrorKey::MyCoupons).await {
                Ok(held) => held,
                Err(error) => {
                    warn!(id = %coupon.id, %error, "coupon mirror unreadable, not recording");
                    return false;
                }
            };

        if id_set(&held).contains(&coupon.id) {
            debug!(id = %coupon.id, "coupon already received");
            return false;
        }

        held.push(coupon.received_copy(Timestamp::now()));

        match write_collection(self.mirror.as_ref(), MirrorKey::MyCoupons, &held).await {
            Ok(()) => true,
            Err(error) => {
                warn!(id = %coupon.id, %error, "failed to record received coupon");
                false
            }
        }
    }

    /// Move a mirrored coupon from available to used.
    ///
    /// Returns `false` for unknown or already used coupons.
    pub async fn mark_used(&self, id: &CouponId) -> bool {
        let mut held: Vec<Coupon> =
            match try_read_collection(self.mirror.as_ref(), MirrorKey::MyCoupons).await {
                Ok(held) => held,
                Err(error) => {
                    warn!(%id, %error, "coupon mirror unreadable");
                    return false;
                }
            };

        let Some(coupon) = held.iter_mut().find(|coupon| coupon.id == *id) else {
            return false;
        };

        if !coupon.mark_used() {
            return false;
        }

        match write_collection(self.mirror.as_ref(), MirrorKey::MyCoupons, &held).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%id, %error, "failed to record used coupon");
                false
            }
        }
    }

    /// Coupons on offer with their received flag.
    pub async fn offers(&self) -> Vec<CouponOffer> {
        let coupons = self.fetch_available().await;
        let held = id_set(&self.mirrored().await);

        coupons
            .into_iter()
            .map(|coupon| {
                let received = coupon.received.unwrap_or(false) || held.contains(&coupon.id);

                CouponOffer { coupon, received }
            })
            .collect()
    }

    /// Receive a coupon on offer.
    ///
    /// The mirror is updated and success is shown even when the backend call
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Unauthenticated`] when the user is not signed
    /// in; nothing is sent or recorded in that case.
    pub async fn receive(&self, coupon: &Coupon, authenticated: bool) -> Result<(), CouponError> {
        if !authenticated {
            self.notifier
                .notify(NoticeKind::Failure, messages::LOGIN_REQUIRED);

            return Err(CouponError::Unauthenticated);
        }

        if let Err(error) = self.gateway.receive(coupon.id.clone()).await {
            warn!(id = %coupon.id, %error, "remote coupon receive failed");
        }

        self.mark_received(coupon).await;

        info!(id = %coupon.id, "coupon received");
        self.notifier
            .notify(NoticeKind::Success, messages::COUPON_RECEIVED);

        Ok(())
    }

    /// Look up a coupon on offer by id and receive it.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::NotOffered`] when no listed coupon has `id`, or
    /// [`CouponError::Unauthenticated`] when the user is not signed in.
    pub async fn receive_by_id(
        &self,
        id: &CouponId,
        authenticated: bool,
    ) -> Result<Coupon, CouponError> {
        let coupon = self
            .fetch_available()
            .await
            .into_iter()
            .find(|coupon| coupon.id == *id)
            .ok_or_else(|| CouponError::NotOffered(id.clone()))?;

        self.receive(&coupon, authenticated).await?;

        Ok(coupon)
    }

    async fn or_mirrored(
        &self,
        remote: Result<Vec<Coupon>, GatewayError>,
        filter: StatusFilter,
    ) -> Vec<Coupon> {
        match remote {
            Ok(coupons) if !coupons.is_empty() => return coupons,
            Ok(_) => debug!("backend returned no coupons, using mirror"),
            Err(error) => warn!(%error, "coupon listing failed, using mirror"),
        }

        filter_by_status(self.mirrored().await, filter)
    }
}

impl Debug for CouponCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CouponCache").finish_non_exhaustive()
    }
}
