//! In-memory mirror, scoped to a single process.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{MirrorError, MirrorKey, MirrorStore};

/// Mirror that keeps values in a shared map.
///
/// Clones share the same map, so a test can hand one clone to the code under
/// test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMirror {
    inner: Arc<RwLock<HashMap<MirrorKey, Value>>>,
}

impl InMemoryMirror {
    /// Create an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MirrorStore for InMemoryMirror {
    async fn read(&self, key: MirrorKey) -> Result<Option<Value>, MirrorError> {
        Ok(self.inner.read().await.get(&key).cloned())
    }

    async fn write(&self, key: MirrorKey, value: Value) -> Result<(), MirrorError> {
        self.inner.write().await.insert(key, value);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn clones_share_state() -> TestResult {
        let mirror = InMemoryMirror::new();
        let other = mirror.clone();

        mirror
            .write(MirrorKey::SelectedCartItems, json!([1, 2]))
            .await?;

        assert_eq!(
            other.read(MirrorKey::SelectedCartItems).await?,
            Some(json!([1, 2]))
        );
        assert_eq!(other.read(MirrorKey::MyCoupons).await?, None);

        Ok(())
    }
}
