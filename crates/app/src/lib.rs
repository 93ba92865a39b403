//! Pawcart client services.
//!
//! Optimistic cart sessions and the coupon cache, wired to the shop backend
//! through a REST gateway and to a persistent local mirror.

pub mod context;
pub mod domain;
pub mod gateway;
pub mod mirror;
pub mod notify;

#[cfg(test)]
mod test;
