//! # Droste Store
//!
//! Persisted frame timeline. The chain orchestrator is the only writer; the
//! viewer reads frames back through [`load_ordered`].

mod error;
mod file_store;
mod store;

pub use error::{Result, StoreError};
pub use file_store::JsonFileStore;
pub use store::{frame_id, load_ordered, FrameStore, MemoryFrameStore, StoredFrame};
