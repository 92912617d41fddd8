//! Reachability capability.
//!
//! Confirms that a candidate URL still answers before it is surfaced.
//! Any failure (timeout, DNS, non-200 status) counts as unreachable.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use crate::search::SearchError;

/// Checks whether an image URL can be fetched.
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// `HEAD`-request reachability check, following redirects.
pub struct HttpReachability {
    client: reqwest::Client,
}

impl HttpReachability {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityCheck for HttpReachability {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                tracing::debug!(url = %url, error = %err, "reachability check failed");
                false
            }
        }
    }
}
