use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavigationError>;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Frame {index} does not exist ({count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    #[error("Frame store error: {0}")]
    Store(#[from] droste_store::StoreError),
}
