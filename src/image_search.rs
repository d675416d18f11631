//! Stock photo search used to find pictures for flies that have none.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const CUSTOM_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
const RESULTS_PER_SEARCH: u8 = 5;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("image search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image search returned http {status}: {body}")]
    Http { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHit {
    pub link: String,
    pub title: String,
    pub thumbnail_link: Option<String>,
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, SearchError>;
}

/// Query string used for a fly name.
pub fn fly_query(fly_name: &str) -> String {
    format!("{} fly fishing fly", fly_name)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    link: String,
    #[serde(default)]
    title: String,
    image: Option<SearchImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchImage {
    thumbnail_link: Option<String>,
}

impl From<SearchItem> for ImageHit {
    fn from(item: SearchItem) -> Self {
        Self {
            link: item.link,
            title: item.title,
            thumbnail_link: item.image.and_then(|i| i.thumbnail_link),
        }
    }
}

pub struct GoogleImageSearch {
    client: Client,
    api_key: String,
    engine_id: String,
}

impl GoogleImageSearch {
    pub fn new(api_key: String, engine_id: String) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            api_key,
            engine_id,
        })
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, SearchError> {
        let num = RESULTS_PER_SEARCH.to_string();
        let response = self
            .client
            .get(CUSTOM_SEARCH_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.items.into_iter().map(ImageHit::from).collect())
    }
}
