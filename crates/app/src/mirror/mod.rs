//! Persistent mirror store.
//!
//! A key-value store that survives across sessions. It backs the local coupon
//! copy used when the backend yields nothing, and the checkout handoff.
//! Readers treat an absent key as an empty collection.

use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

mod file;
mod memory;

pub use file::FileMirror;
pub use memory::InMemoryMirror;

/// Fixed keys in the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorKey {
    /// Locally received coupons
    MyCoupons,

    /// Checkout handoff snapshot
    SelectedCartItems,
}

impl MirrorKey {
    /// Storage identifier of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MyCoupons => "myCoupons",
            Self::SelectedCartItems => "selectedCartItems",
        }
    }
}

impl Display for MirrorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Errors raised by mirror backends.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The backing storage could not be read or written.
    #[error("mirror storage error")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded.
    #[error("mirror encoding error")]
    Encoding(#[from] serde_json::Error),
}

/// Key-value persistence for mirrored data.
#[automock]
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Read the value under `key`, `None` when absent.
    async fn read(&self, key: MirrorKey) -> Result<Option<Value>, MirrorError>;

    /// Replace the value under `key`.
    async fn write(&self, key: MirrorKey, value: Value) -> Result<(), MirrorError>;
}

/// Read a collection, failing on storage or decoding errors.
///
/// An absent key is an empty collection.
///
/// # Errors
///
/// Returns an error when the store fails or the value does not decode.
pub async fn try_read_collection<T: DeserializeOwned>(
    store: &dyn MirrorStore,
    key: MirrorKey,
) -> Result<Vec<T>, MirrorError> {
    match store.read(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Read a collection, treating any failure as an empty mirror.
pub async fn read_collection<T: DeserializeOwned>(store: &dyn MirrorStore, key: MirrorKey) -> Vec<T> {
    try_read_collection(store, key).await.unwrap_or_else(|error| {
        warn!(%key, %error, "mirror unavailable, treating as empty");
        Vec::new()
    })
}

/// Replace a collection.
///
/// # Errors
///
/// Returns an error when the items cannot be encoded or the store fails.
pub async fn write_collection<T: Serialize>(
    store: &dyn MirrorStore,
    key: MirrorKey,
    items: &[T],
) -> Result<(), MirrorError> {
    store.write(key, serde_json::to_value(items)?).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn absent_key_reads_as_empty() -> TestResult {
        let mut store = MockMirrorStore::new();

        store
            .expect_read()
            .once()
            .withf(|key| *key == MirrorKey::MyCoupons)
            .returning(|_| Ok(None));

        let items: Vec<u32> = try_read_collection(&store, MirrorKey::MyCoupons).await?;

        assert!(items.is_empty(), "absent key is an empty collection");

        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_reads_as_empty() {
        let mut store = MockMirrorStore::new();

        store
            .expect_read()
            .once()
            .returning(|_| Err(MirrorError::Io(std::io::Error::other("disk gone"))));

        let items: Vec<u32> = read_collection(&store, MirrorKey::MyCoupons).await;

        assert!(items.is_empty(), "unavailable mirror is an empty collection");
    }

    #[tokio::test]
    async fn undecodable_value_fails_strict_read() {
        let mut store = MockMirrorStore::new();

        store
            .expect_read()
            .once()
            .returning(|_| Ok(Some(json!({"not": "a list"}))));

        let result = try_read_collection::<u32>(&store, MirrorKey::MyCoupons).await;

        assert!(
            matches!(result, Err(MirrorError::Encoding(_))),
            "expected Encoding, got {result:?}"
        );
    }

    #[test]
    fn keys_use_fixed_identifiers() {
        assert_eq!(MirrorKey::MyCoupons.as_str(), "myCoupons");
        assert_eq!(MirrorKey::SelectedCartItems.as_str(), "selectedCartItems");
    }
}
