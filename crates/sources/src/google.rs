//! Google Custom Search image backend.
//!
//! Requires an API key and a search engine id configured for image search.
//! The API serves at most 10 results per request and about 100 per query.

use crate::search::{ImageSearch, MAX_PAGE_SIZE, SearchError};
use crate::settings::SearchSettings;
use async_trait::async_trait;
use image_model::RawImageRecord;
use serde::Deserialize;

/// Response envelope. A query without results has no `items` at all.
#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CseItem {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    display_link: String,
    #[serde(default)]
    image: CseImage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CseImage {
    context_link: String,
    thumbnail_link: String,
    width: u32,
    height: u32,
    byte_size: u64,
}

impl From<CseItem> for RawImageRecord {
    fn from(item: CseItem) -> Self {
        RawImageRecord {
            link: item.link,
            title: item.title,
            thumbnail_link: item.image.thumbnail_link,
            width: item.image.width,
            height: item.image.height,
            byte_size: item.image.byte_size,
            context_link: item.image.context_link,
            display_link: item.display_link,
            mime_type: item.mime,
        }
    }
}

/// Parse a Custom Search JSON body into raw image records.
pub fn parse_response(body: &str) -> Result<Vec<RawImageRecord>, SearchError> {
    let response: CseResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;
    Ok(response.items.into_iter().map(RawImageRecord::from).collect())
}

/// Google Custom Search image provider
pub struct GoogleImageSearch {
    client: reqwest::Client,
    settings: SearchSettings,
}

impl GoogleImageSearch {
    /// Create a provider from explicit settings.
    ///
    /// The HTTP client carries the batch timeout as its request timeout, so a
    /// hung upstream surfaces as a network error even outside the aggregator.
    pub fn new(settings: SearchSettings) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.batch_timeout())
            .build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    fn name(&self) -> &str {
        "google-custom-search"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        start: usize,
    ) -> Result<Vec<RawImageRecord>, SearchError> {
        if self.settings.api_key.is_empty() {
            return Err(SearchError::InvalidApiKey);
        }

        let num = max_results.clamp(1, MAX_PAGE_SIZE);
        tracing::debug!(query = %query, num, start, "performing google image search");

        let response = self
            .client
            .get(&self.settings.endpoint)
            .query(&[
                ("key", self.settings.api_key.as_str()),
                ("cx", self.settings.search_engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", &num.to_string()),
                ("start", &start.to_string()),
                ("safe", self.settings.safe_search.as_str()),
                ("imgSize", self.settings.image_size.as_str()),
                ("imgColorType", self.settings.color_type.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            tracing::warn!(status = %status, error = %error_text, "google image search api error");

            return match status.as_u16() {
                401 | 403 => Err(SearchError::InvalidApiKey),
                429 => Err(SearchError::RateLimited),
                code => Err(SearchError::Api {
                    status: code,
                    body: error_text,
                }),
            };
        }

        let body = response.text().await?;
        let records = parse_response(&body)?;

        tracing::debug!(query = %query, start, result_count = records.len(), "google image search completed");
        Ok(records)
    }
}
