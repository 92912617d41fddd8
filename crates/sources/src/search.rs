//! The search capability the aggregator drives.
//!
//! Any image search backend can be plugged in by implementing `ImageSearch`;
//! `GoogleImageSearch` is the production implementation.

use async_trait::async_trait;
use image_model::RawImageRecord;
use std::time::Duration;

/// Upstream ceiling on results per request
pub const MAX_PAGE_SIZE: usize = 10;

/// Highest 1-based start offset the upstream accepts (about 100 results total)
pub const MAX_START_OFFSET: usize = 91;

/// Image search backend abstraction.
///
/// ## Design Note
/// - `Send + Sync` so one backend can be shared by concurrent pipeline runs
/// - Implementations must not retry internally; the aggregator owns the
///   batch loop and its termination policy
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Name of this backend (for logging)
    fn name(&self) -> &str;

    /// Fetch one batch of results.
    ///
    /// # Arguments
    /// * `query` - Free-text query string
    /// * `max_results` - Batch size, never more than `MAX_PAGE_SIZE`
    /// * `start` - 1-based offset of the first result
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        start: usize,
    ) -> Result<Vec<RawImageRecord>, SearchError>;
}

/// Search-related errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Search batch timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Could not decode search response: {0}")]
    Decode(String),
}
