//! # Sources Crate
//!
//! Candidate gathering for image discovery.
//!
//! ## Components
//!
//! ### Search capability
//! `ImageSearch` is the backend seam; `GoogleImageSearch` talks to the
//! Google Custom Search JSON API in image mode.
//!
//! ### Search Aggregator
//! Drives a backend batch by batch (at most 10 results per batch, start
//! offsets never past 91) and normalizes raw items into `Candidate`s.
//!
//! ### Reachability
//! `ReachabilityCheck` confirms a URL still answers; `HttpReachability` does
//! it with a `HEAD` request.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{GoogleImageSearch, SearchAggregator, SearchSettings};
//! use image_model::SearchQuery;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let settings = SearchSettings { api_key, search_engine_id, ..Default::default() };
//! let google = Arc::new(GoogleImageSearch::new(settings.clone())?);
//! let aggregator = SearchAggregator::from_settings(google, &settings);
//!
//! let query = SearchQuery::new("Jane Doe", "professional photo", 20);
//! let aggregation = aggregator.aggregate(&query, &CancellationToken::new()).await?;
//! ```

// Public modules
pub mod aggregator;
pub mod google;
pub mod reachability;
pub mod search;
pub mod settings;

// Re-export commonly used types
pub use aggregator::{Aggregation, SearchAggregator};
pub use google::GoogleImageSearch;
pub use reachability::{HttpReachability, ReachabilityCheck};
pub use search::{ImageSearch, MAX_PAGE_SIZE, MAX_START_OFFSET, SearchError};
pub use settings::SearchSettings;
