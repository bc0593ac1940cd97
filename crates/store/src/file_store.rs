use crate::error::{Result, StoreError};
use crate::store::{frame_id, FrameStore, StoredFrame};
use async_trait::async_trait;
use droste_protocol::{Frame, FRAME_SCHEMA_VERSION};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedFrames {
    schema_version: u32,
    frames: BTreeMap<String, Frame>,
}

struct StoreWriteLock {
    file: std::fs::File,
}

impl Drop for StoreWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Frames persisted as one JSON document, rewritten atomically on every append
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    async fn acquire_write_lock(&self) -> Result<StoreWriteLock> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let path = self.lock_path();

        tokio::task::spawn_blocking(move || -> Result<StoreWriteLock> {
            use std::fs::OpenOptions;

            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .map_err(|err| StoreError::Lock(format!("open {}: {err}", path.display())))?;
            file.lock_exclusive()
                .map_err(|err| StoreError::Lock(format!("acquire {}: {err}", path.display())))?;
            Ok(StoreWriteLock { file })
        })
        .await
        .map_err(|err| StoreError::Lock(format!("join lock task: {err}")))?
    }

    async fn read(&self) -> Result<PersistedFrames> {
        if !self.path.exists() {
            return Ok(PersistedFrames {
                schema_version: FRAME_SCHEMA_VERSION,
                frames: BTreeMap::new(),
            });
        }
        let bytes = tokio::fs::read(&self.path).await?;
        let persisted: PersistedFrames = serde_json::from_slice(&bytes)?;
        if persisted.schema_version != FRAME_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: persisted.schema_version,
                expected: FRAME_SCHEMA_VERSION,
            });
        }
        Ok(persisted)
    }

    async fn write(&self, persisted: &PersistedFrames) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(persisted)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl FrameStore for JsonFileStore {
    async fn append(&self, frame: &Frame) -> Result<String> {
        let _lock = self.acquire_write_lock().await?;
        let mut persisted = self.read().await?;
        let id = frame_id(frame);
        persisted.frames.insert(id.clone(), frame.clone());
        self.write(&persisted).await?;
        log::debug!("Persisted frame {} to {}", frame.index, self.path.display());
        Ok(id)
    }

    async fn load_all(&self) -> Result<Vec<StoredFrame>> {
        let persisted = self.read().await?;
        Ok(persisted
            .frames
            .into_iter()
            .map(|(id, frame)| StoredFrame { id, frame })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        let _lock = self.acquire_write_lock().await?;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
