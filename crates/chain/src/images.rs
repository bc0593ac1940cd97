use crate::error::ImageError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use droste_graph::LinkSource;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

type Result<T> = std::result::Result<T, ImageError>;

/// An image ready to be sent to a model, plus the reference it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub reference: String,
    pub data_url: String,
}

impl ImagePayload {
    pub fn new(reference: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            data_url: data_url.into(),
        }
    }
}

/// Turns a stored image reference (media title, URL or data URL) into a payload
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<ImagePayload>;
}

/// Resolves media titles through the link source, then downloads and
/// base64-encodes the image.
pub struct HttpImageResolver {
    client: Client,
    media: Arc<dyn LinkSource>,
}

impl HttpImageResolver {
    pub fn new(media: Arc<dyn LinkSource>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("droste/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, media))
    }

    pub fn with_client(client: Client, media: Arc<dyn LinkSource>) -> Self {
        Self { client, media }
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|mime| mime.starts_with("image/"));
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ImageError::Empty(url.to_string()));
        }

        let mime = header_mime.unwrap_or_else(|| guess_image_mime(url).to_string());
        Ok(format!("data:{mime};base64,{}", BASE64.encode(&bytes)))
    }
}

#[async_trait]
impl ImageResolver for HttpImageResolver {
    async fn resolve(&self, reference: &str) -> Result<ImagePayload> {
        if reference.starts_with("data:") {
            return Ok(ImagePayload::new(reference, reference));
        }

        let url = if is_remote(reference) {
            reference.to_string()
        } else {
            self.media.media_url(reference).await?
        };
        log::debug!("Downloading {reference} from {url}");
        let data_url = self.download(&url).await?;
        Ok(ImagePayload::new(reference, data_url))
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("https://") || reference.starts_with("http://")
}

/// MIME type from the file extension, ignoring any query string
pub fn guess_image_mime(reference: &str) -> &'static str {
    let path = reference.split(['?', '#']).next().unwrap_or(reference);
    let lower = path.to_ascii_lowercase();
    match lower.rsplit('.').next() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "image/png",
    }
}
