use crate::error::Result;
use async_trait::async_trait;
use droste_protocol::{sort_frames, Frame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// A persisted frame and the id the store assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFrame {
    pub id: String,
    pub frame: Frame,
}

/// Key-value record store for frames.
///
/// `append` must be durable before it returns. `load_all` makes no ordering
/// promise; use [`load_ordered`] to rebuild chain order.
#[async_trait]
pub trait FrameStore: Send + Sync {
    async fn append(&self, frame: &Frame) -> Result<String>;

    async fn load_all(&self) -> Result<Vec<StoredFrame>>;

    async fn clear(&self) -> Result<()>;
}

pub fn frame_id(frame: &Frame) -> String {
    format!("frame-{:05}-{}", frame.index, frame.created_at_ms)
}

/// Load every frame and sort by creation time.
pub async fn load_ordered(store: &dyn FrameStore) -> Result<Vec<Frame>> {
    let mut frames: Vec<Frame> = store
        .load_all()
        .await?
        .into_iter()
        .map(|stored| stored.frame)
        .collect();
    sort_frames(&mut frames);
    Ok(frames)
}

/// Process-local store
#[derive(Default)]
pub struct MemoryFrameStore {
    records: Mutex<BTreeMap<String, Frame>>,
}

impl MemoryFrameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FrameStore for MemoryFrameStore {
    async fn append(&self, frame: &Frame) -> Result<String> {
        let id = frame_id(frame);
        self.records.lock().await.insert(id.clone(), frame.clone());
        Ok(id)
    }

    async fn load_all(&self) -> Result<Vec<StoredFrame>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .map(|(id, frame)| StoredFrame {
                id: id.clone(),
                frame: frame.clone(),
            })
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.records.lock().await.clear();
        Ok(())
    }
}
