//! Carts

pub mod checkout;
pub mod errors;
pub mod session;

pub use checkout::{CheckoutSnapshot, read_checkout_snapshot};
pub use errors::CheckoutError;
pub use session::{BatchOutcome, CartSession};
