use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported frame store schema_version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Frame store lock error: {0}")]
    Lock(String),

    #[error("{0}")]
    Other(String),
}
