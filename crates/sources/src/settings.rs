//! Settings for the search side of the pipeline.
//!
//! Deserialized from the `[search]` table of the discovery config file.
//! Every field has a default so partial files are valid.

use crate::search::{MAX_PAGE_SIZE, MAX_START_OFFSET};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Credentials, endpoint and paging limits for the image search source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub api_key: String,
    pub search_engine_id: String,
    pub endpoint: String,
    /// Results per batch, clamped to `MAX_PAGE_SIZE`
    pub page_size_limit: usize,
    /// Highest start offset requested, clamped to `MAX_START_OFFSET`
    pub offset_ceiling: usize,
    pub batch_timeout_secs: u64,
    pub safe_search: String,
    pub image_size: String,
    pub color_type: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            search_engine_id: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size_limit: MAX_PAGE_SIZE,
            offset_ceiling: MAX_START_OFFSET,
            batch_timeout_secs: 10,
            safe_search: "off".to_string(),
            image_size: "large".to_string(),
            color_type: "color".to_string(),
        }
    }
}

impl SearchSettings {
    /// Batch size actually used, within [1, MAX_PAGE_SIZE]
    pub fn effective_page_size(&self) -> usize {
        self.page_size_limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Start-offset ceiling actually used, within [1, MAX_START_OFFSET]
    pub fn effective_offset_ceiling(&self) -> usize {
        self.offset_ceiling.clamp(1, MAX_START_OFFSET)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs.max(1))
    }
}
