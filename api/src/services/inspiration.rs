//! Image search for the creative studio, backed by Unsplash.

use serde::Deserialize;
use thiserror::Error;

use crate::error::MarketError;

const UNSPLASH_API: &str = "https://api.unsplash.com";
const PER_PAGE: &str = "6";

#[derive(Debug, Error)]
pub enum InspirationError {
    #[error("UNSPLASH_ACCESS_KEY is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<InspirationError> for MarketError {
    fn from(err: InspirationError) -> Self {
        MarketError::internal(err)
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Deserialize, Debug)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Deserialize, Debug)]
struct PhotoUrls {
    small: String,
}

impl SearchResponse {
    pub fn small_urls(self) -> Vec<String> {
        self.results.into_iter().map(|photo| photo.urls.small).collect()
    }
}

pub struct Inspiration {
    client: reqwest::Client,
    access_key: Option<String>,
}

impl Inspiration {
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_key: access_key.filter(|key| !key.is_empty()),
        }
    }

    pub async fn search_images(&self, query: &str) -> Result<Vec<String>, MarketError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MarketError::validation("Query is required"));
        }
        Ok(self.search(query).await?)
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, InspirationError> {
        let key = self.access_key.as_deref().ok_or(InspirationError::NotConfigured)?;
        let response = self
            .client
            .get(format!("{UNSPLASH_API}/search/photos"))
            .query(&[("query", query), ("per_page", PER_PAGE)])
            .header("Authorization", format!("Client-ID {key}"))
            .send()
            .await?
            .error_for_status()?;
        let body: SearchResponse = response.json().await?;
        let urls = body.small_urls();
        tracing::debug!(query = %query, hits = urls.len(), "image search");
        Ok(urls)
    }
}
