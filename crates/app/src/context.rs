//! App Context

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::{
    domain::{carts::CartSession, coupons::CouponCache},
    gateway::{CartGateway, CouponGateway, GatewayError, HttpGateway, HttpGatewayConfig},
    mirror::{FileMirror, MirrorStore},
    notify::{Notifier, TracingNotifier},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build backend client")]
    Gateway(#[source] GatewayError),
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartGateway>,
    pub coupons: Arc<dyn CouponGateway>,
    pub mirror: Arc<dyn MirrorStore>,
    pub notifier: Arc<dyn Notifier>,
    authenticated: bool,
}

impl AppContext {
    /// Build application context talking to the HTTP backend, mirroring into
    /// `mirror_dir` and reporting toasts through the log.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn from_config(
        gateway: HttpGatewayConfig,
        mirror_dir: impl Into<PathBuf>,
    ) -> Result<Self, AppInitError> {
        let authenticated = gateway.token.is_some();
        let http = Arc::new(HttpGateway::new(gateway).map_err(AppInitError::Gateway)?);

        Ok(Self {
            carts: http.clone(),
            coupons: http,
            mirror: Arc::new(FileMirror::new(mirror_dir)),
            notifier: Arc::new(TracingNotifier),
            authenticated,
        })
    }

    /// Whether requests carry a user token.
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// Start a new cart session with an empty cart.
    pub fn cart_session(&self) -> CartSession {
        CartSession::new(
            Arc::clone(&self.carts),
            Arc::clone(&self.mirror),
            Arc::clone(&self.notifier),
        )
    }

    pub fn coupon_cache(&self) -> CouponCache {
        CouponCache::new(
            Arc::clone(&self.coupons),
            Arc::clone(&self.mirror),
            Arc::clone(&self.notifier),
        )
    }
}
