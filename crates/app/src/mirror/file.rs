//! File-backed mirror: one JSON document per key in a directory.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::{MirrorError, MirrorKey, MirrorStore};

/// Mirror persisted as `<dir>/<key>.json` files.
#[derive(Debug, Clone)]
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    /// Create a mirror rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the mirror files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: MirrorKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl MirrorStore for FileMirror {
    async fn read(&self, key: MirrorKey) -> Result<Option<Value>, MirrorError> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn write(&self, key: MirrorKey, value: Value) -> Result<(), MirrorError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path(key);
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, serde_json::to_vec_pretty(&value)?).await?;
        fs::rename(&staging, &path).await?;

        Ok(())
    }
}
