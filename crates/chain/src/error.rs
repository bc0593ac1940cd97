use droste_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

/// Failure of a remote model call. Always absorbed by the orchestrator.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model call failed: {status} {body}")]
    Status { status: u16, body: String },

    #[error("No output generated by {0}")]
    EmptyOutput(String),

    #[error("Unexpected model response: {0}")]
    Malformed(String),

    #[error("Model call timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure to turn an image reference into a transferable payload
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Media lookup failed: {0}")]
    Media(#[from] droste_graph::GraphError),

    #[error("Image download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image download timed out after {0} ms")]
    Timeout(u64),

    #[error("Empty image body for {0}")]
    Empty(String),
}

/// Errors that end a chain run
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Seed image for '{title}' could not be resolved: {reason}")]
    SeedUnavailable { title: String, reason: String },

    #[error("Failed to persist frame {index}: {source}")]
    Persistence { index: usize, source: StoreError },

    #[error("Failed to clear frame store: {0}")]
    Clear(#[source] StoreError),

    #[error("Run superseded by a newer search after {persisted} frames")]
    Superseded { persisted: usize },
}
