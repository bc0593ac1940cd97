use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// A title or relation could not be resolved (node is skipped)
    #[error("Graph resolution error: {0}")]
    Resolution(String),

    /// The node has no usable raster image (node is dropped)
    #[error("No raster image found for: {0}")]
    MediaNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GraphError {
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn media_not_found(title: impl Into<String>) -> Self {
        Self::MediaNotFound(title.into())
    }
}
