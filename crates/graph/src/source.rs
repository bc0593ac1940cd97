use crate::error::Result;
use crate::types::Topic;
use async_trait::async_trait;

/// Raster image extensions accepted as a node's representative image
pub const RASTER_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".tiff", ".bmp", ".webp"];

/// Read-only link graph. Implementations do not retry; callers treat any
/// error as a skip of the affected node.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Resolve a title to its canonical page, `None` when the page does not exist
    async fn resolve(&self, title: &str) -> Result<Option<Topic>>;

    /// Pages linking to `topic` ("what links here"), in source order
    async fn links_here(&self, topic: &Topic, limit: usize) -> Result<Vec<Topic>>;

    /// Media titles attached to `topic`
    async fn media(&self, topic: &Topic) -> Result<Vec<String>>;

    /// Direct download URL for a media title
    async fn media_url(&self, media_title: &str) -> Result<String>;
}

pub fn is_raster_image(media_title: &str) -> bool {
    let lower = media_title.to_ascii_lowercase();
    RASTER_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
