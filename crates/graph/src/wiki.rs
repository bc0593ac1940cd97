use crate::error::{GraphError, Result};
use crate::source::LinkSource;
use crate::types::Topic;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

const USER_AGENT: &str = concat!("droste/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: BTreeMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    pageid: Option<u64>,
    title: String,
    missing: Option<serde_json::Value>,
    #[serde(default)]
    linkshere: Vec<PageRef>,
    #[serde(default)]
    images: Vec<MediaRef>,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageRef {
    pageid: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct MediaRef {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
}

/// [`LinkSource`] backed by the MediaWiki action API
#[derive(Clone)]
pub struct MediaWikiSource {
    client: Client,
    api_url: String,
}

impl MediaWikiSource {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, api_url))
    }

    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<QueryBody> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("origin", "*")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response.json().await?;
        body.query
            .ok_or_else(|| GraphError::resolution("response has no query section"))
    }

    fn first_page(body: QueryBody, what: &str) -> Result<Page> {
        body.pages
            .into_values()
            .next()
            .ok_or_else(|| GraphError::resolution(format!("no page returned for {what}")))
    }
}

#[async_trait]
impl LinkSource for MediaWikiSource {
    async fn resolve(&self, title: &str) -> Result<Option<Topic>> {
        let body = self
            .query(&[("titles", title.to_string()), ("redirects", "1".to_string())])
            .await?;
        let page = Self::first_page(body, title)?;
        if page.missing.is_some() {
            return Ok(None);
        }
        Ok(page.pageid.map(|id| Topic::new(id, page.title)))
    }

    async fn links_here(&self, topic: &Topic, limit: usize) -> Result<Vec<Topic>> {
        let body = self
            .query(&[
                ("prop", "linkshere".to_string()),
                ("pageids", topic.id.to_string()),
                ("lhnamespace", "0".to_string()),
                ("lhlimit", limit.max(1).to_string()),
            ])
            .await?;
        let page = Self::first_page(body, &topic.title)?;
        Ok(page
            .linkshere
            .into_iter()
            .map(|link| Topic::new(link.pageid, link.title))
            .collect())
    }

    async fn media(&self, topic: &Topic) -> Result<Vec<String>> {
        let body = self
            .query(&[
                ("prop", "images".to_string()),
                ("pageids", topic.id.to_string()),
                ("imlimit", "max".to_string()),
            ])
            .await?;
        let page = Self::first_page(body, &topic.title)?;
        Ok(page.images.into_iter().map(|media| media.title).collect())
    }

    async fn media_url(&self, media_title: &str) -> Result<String> {
        let body = self
            .query(&[
                ("titles", media_title.to_string()),
                ("prop", "imageinfo".to_string()),
                ("iiprop", "url".to_string()),
            ])
            .await?;
        let page = Self::first_page(body, media_title)?;
        page.imageinfo
            .into_iter()
            .next()
            .map(|info| info.url)
            .ok_or_else(|| GraphError::media_not_found(media_title))
    }
}
