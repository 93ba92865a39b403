//! Cart session errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("no cart items are selected")]
    NothingSelected,
}
