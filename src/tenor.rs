use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::TenorConfig;

/// Why a GIF lookup produced nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("request to Tenor failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected Tenor response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no GIF found for {0:?}")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    media_formats: MediaFormats,
}

#[derive(Debug, Deserialize)]
struct MediaFormats {
    gif: MediaObject,
}

#[derive(Debug, Deserialize)]
struct MediaObject {
    url: String,
}

/// Anything that can turn a keyword into a GIF URL.
#[async_trait]
pub trait GifSearch: Send + Sync {
    async fn fetch_gif(&self, keyword: &str) -> Result<String, SearchError>;
}

pub struct TenorClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl TenorClient {
    pub fn new(config: &TenorConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid Tenor base URL: {}", config.base_url))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Search endpoint with the query string for a single minimal result.
    pub fn search_url(&self, keyword: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("q", keyword)
            .append_pair("key", &self.api_key)
            .append_pair("limit", "1")
            .append_pair("media_filter", "minimal");
        url
    }
}

#[async_trait]
impl GifSearch for TenorClient {
    async fn fetch_gif(&self, keyword: &str) -> Result<String, SearchError> {
        let url = self.search_url(keyword);

        debug!("Searching Tenor for {:?}", keyword);

        let response = self.client.get(url).send().await?;
        debug!("Tenor responded with {}", response.status());

        let body = response.bytes().await?;
        first_gif_url(&body, keyword)
    }
}

/// Decode a search envelope and pull out the first result's GIF URL.
pub fn first_gif_url(body: &[u8], keyword: &str) -> Result<String, SearchError> {
    let envelope: SearchResponse = serde_json::from_slice(body)?;

    envelope
        .results
        .into_iter()
        .next()
        .map(|result| result.media_formats.gif.url)
        .ok_or_else(|| SearchError::NotFound(keyword.to_string()))
}
