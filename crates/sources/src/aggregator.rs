//! Search Aggregator - paginated multi-batch result gathering
//!
//! Drives an `ImageSearch` backend batch by batch until enough candidates
//! have been gathered or the source cannot give more.
//!
//! ## Algorithm
//! 1. Start at offset 1, request `min(page_size, remaining)` results
//! 2. Normalize every raw item; skip items without an image URL and
//!    duplicates of URLs already seen
//! 3. Advance the offset by the requested batch size
//! 4. Stop when:
//!    - the target count is reached
//!    - a batch comes back short (authoritative end of results)
//!    - the next offset would pass the ceiling
//!    - a batch after the first fails or times out (keep what we have)
//!    - the caller cancelled
//!
//! A failure on the very first batch is the only error returned.

use crate::search::{ImageSearch, MAX_PAGE_SIZE, MAX_START_OFFSET, SearchError};
use crate::settings::SearchSettings;
use image_model::normalize::normalize_record;
use image_model::{Candidate, DiscoveryError, SearchQuery, Skip, SkipReason, StopReason};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Everything one aggregation produced.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Normalized candidates in source order, never more than the target
    pub candidates: Vec<Candidate>,
    /// Raw items that did not become candidates
    pub skipped: Vec<Skip>,
    /// Successful batches
    pub batches: usize,
    /// Raw items returned across all batches
    pub raw_seen: usize,
    pub stop: StopReason,
}

impl Aggregation {
    fn empty(stop: StopReason) -> Self {
        Self {
            candidates: Vec::new(),
            skipped: Vec::new(),
            batches: 0,
            raw_seen: 0,
            stop,
        }
    }
}

/// Gathers candidates from a search backend in bounded batches.
#[derive(Clone)]
pub struct SearchAggregator {
    source: Arc<dyn ImageSearch>,
    page_size: usize,
    offset_ceiling: usize,
    batch_timeout: Duration,
}

impl SearchAggregator {
    /// Create an aggregator with the upstream limits and a 10 second batch timeout
    pub fn new(source: Arc<dyn ImageSearch>) -> Self {
        Self {
            source,
            page_size: MAX_PAGE_SIZE,
            offset_ceiling: MAX_START_OFFSET,
            batch_timeout: Duration::from_secs(10),
        }
    }

    /// Create an aggregator using the limits from search settings
    pub fn from_settings(source: Arc<dyn ImageSearch>, settings: &SearchSettings) -> Self {
        Self::new(source)
            .with_page_size(settings.effective_page_size())
            .with_offset_ceiling(settings.effective_offset_ceiling())
            .with_batch_timeout(settings.batch_timeout())
    }

    /// Configure the batch size (clamped to [1, 10])
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Configure the highest start offset (clamped to [1, 91])
    pub fn with_offset_ceiling(mut self, ceiling: usize) -> Self {
        self.offset_ceiling = ceiling.clamp(1, MAX_START_OFFSET);
        self
    }

    /// Configure the per-batch timeout
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Gather up to `query.target_count` candidates.
    ///
    /// # Returns
    /// * `Ok(Aggregation)` - possibly partial; see `Aggregation::stop`
    /// * `Err(DiscoveryError::SourceUnavailable)` - the first batch failed
    #[instrument(skip(self, query, cancel), fields(source = self.source.name(), target = query.target_count))]
    pub async fn aggregate(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<Aggregation, DiscoveryError> {
        let terms = query.search_terms();
        let target = query.target_count;

        if cancel.is_cancelled() {
            return Ok(Aggregation::empty(StopReason::Cancelled));
        }

        let mut aggregation = Aggregation::empty(StopReason::TargetReached);
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut start = 1;

        let stop = loop {
            if aggregation.candidates.len() >= target {
                break StopReason::TargetReached;
            }
            if start > self.offset_ceiling {
                break StopReason::OffsetCeiling;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let requested = self.page_size.min(target - aggregation.candidates.len());
            debug!("Requesting batch: start={}, size={}", start, requested);

            let records = match self.fetch_batch(&terms, requested, start).await {
                Ok(records) => records,
                Err(err) if aggregation.batches == 0 => {
                    warn!(error = %err, "first search batch failed");
                    return Err(DiscoveryError::SourceUnavailable {
                        query: terms,
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        start,
                        kept = aggregation.candidates.len(),
                        "search batch failed, keeping partial results"
                    );
                    break StopReason::SourceError;
                }
            };

            aggregation.batches += 1;
            let returned = records.len();
            aggregation.raw_seen += returned;

            for raw in records {
                if aggregation.candidates.len() >= target {
                    break;
                }
                let link = raw.link.clone();
                match normalize_record(raw) {
                    Ok(candidate) => {
                        if seen_urls.insert(candidate.url.clone()) {
                            aggregation.candidates.push(candidate);
                        } else {
                            aggregation.skipped.push(Skip::new(link, SkipReason::Duplicate));
                        }
                    }
                    Err(reason) => aggregation.skipped.push(Skip::new(link, reason)),
                }
            }

            debug!(
                "Batch at {} returned {} items, {} candidates so far",
                start,
                returned,
                aggregation.candidates.len()
            );

            start += requested;

            if aggregation.candidates.len() >= target {
                break StopReason::TargetReached;
            }
            if returned < requested {
                break StopReason::SourceExhausted;
            }
        };

        aggregation.stop = stop;
        info!(
            "Aggregated {} candidates from {} batches ({} raw, {} skipped, stop={:?})",
            aggregation.candidates.len(),
            aggregation.batches,
            aggregation.raw_seen,
            aggregation.skipped.len(),
            aggregation.stop
        );
        Ok(aggregation)
    }

    /// One batch call bounded by the batch timeout.
    async fn fetch_batch(
        &self,
        terms: &str,
        requested: usize,
        start: usize,
    ) -> Result<Vec<image_model::RawImageRecord>, SearchError> {
        match tokio::time::timeout(self.batch_timeout, self.source.search(terms, requested, start)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                after: self.batch_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image_model::RawImageRecord;
    use std::sync::Mutex;

    /// What the scripted source does on a given call
    enum Step {
        Items(Vec<RawImageRecord>),
        Fail,
        Hang,
    }

    /// Search double that replays a script and records every request
    struct ScriptedSearch {
        steps: Mutex<Vec<Step>>,
        calls: Mutex<Vec<(usize, usize)>>,
        /// When set, every call past the script returns a full page
        endless: bool,
    }

    impl ScriptedSearch {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
                endless: false,
            }
        }

        fn endless() -> Self {
            Self {
                steps: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                endless: true,
            }
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageSearch for ScriptedSearch {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn search(
            &self,
            _query: &str,
            max_results: usize,
            start: usize,
        ) -> Result<Vec<RawImageRecord>, SearchError> {
            self.calls.lock().unwrap().push((start, max_results));
            let step = self.steps.lock().unwrap().pop();
            match step {
                Some(Step::Items(items)) => Ok(items),
                Some(Step::Fail) => Err(SearchError::Api {
                    status: 500,
                    body: "backend error".to_string(),
                }),
                Some(Step::Hang) => {
                    std::future::pending::<()>().await;
                    Ok(Vec::new())
                }
                None if self.endless => Ok(page(start, max_results)),
                None => Ok(Vec::new()),
            }
        }
    }

    fn record(url: &str) -> RawImageRecord {
        RawImageRecord {
            link: url.to_string(),
            width: 800,
            height: 600,
            display_link: "www.example.com".to_string(),
            ..Default::default()
        }
    }

    fn page(start: usize, size: usize) -> Vec<RawImageRecord> {
        (start..start + size)
            .map(|i| record(&format!("https://cdn.example.com/img-{}.jpg", i)))
            .collect()
    }

    fn aggregator(search: Arc<ScriptedSearch>) -> SearchAggregator {
        SearchAggregator::new(search).with_batch_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_never_passes_offset_ceiling_or_page_size() {
        let search = Arc::new(ScriptedSearch::endless());
        let query = SearchQuery::new("Jane Doe", "photo", 1000);

        let result = aggregator(search.clone())
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        let calls = search.calls();
        assert_eq!(calls.len(), 10);
        assert_eq!(calls.first(), Some(&(1, 10)));
        assert_eq!(calls.last(), Some(&(91, 10)));
        assert!(calls.iter().all(|(start, size)| *start <= 91 && *size <= 10));
        assert_eq!(result.stop, StopReason::OffsetCeiling);
        assert_eq!(result.candidates.len(), 100);
    }

    #[tokio::test]
    async fn test_stops_at_target_count() {
        let search = Arc::new(ScriptedSearch::endless());
        let query = SearchQuery::new("Jane Doe", "photo", 25);

        let result = aggregator(search.clone())
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 25);
        assert_eq!(result.stop, StopReason::TargetReached);
        // Last batch only asks for what is still missing
        assert_eq!(search.calls(), vec![(1, 10), (11, 10), (21, 5)]);
    }

    #[tokio::test]
    async fn test_short_batch_ends_aggregation() {
        let search = Arc::new(ScriptedSearch::new(vec![
            Step::Items(page(1, 10)),
            Step::Items(page(11, 4)),
            Step::Items(page(15, 10)),
        ]));
        let query = SearchQuery::new("Jane Doe", "photo", 50);

        let result = aggregator(search.clone())
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 14);
        assert_eq!(result.stop, StopReason::SourceExhausted);
        assert_eq!(search.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_discards_unusable_items_without_counting_them() {
        let mut items = page(1, 8);
        items.push(record(""));
        items.push(record("https://example.com/gallery/page"));
        let search = Arc::new(ScriptedSearch::new(vec![Step::Items(items), Step::Items(page(11, 3))]));
        let query = SearchQuery::new("Jane Doe", "photo", 20);

        let result = aggregator(search)
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 11);
        assert!(result.candidates.iter().all(|c| !c.url.is_empty()));
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].reason, SkipReason::MissingUrl);
        assert_eq!(result.skipped[1].reason, SkipReason::UnrecognizedFormat);
        assert_eq!(result.raw_seen, 13);
    }

    #[tokio::test]
    async fn test_duplicate_urls_are_skipped() {
        let mut second = page(1, 2);
        second.extend(page(11, 8));
        let search = Arc::new(ScriptedSearch::new(vec![Step::Items(page(1, 10)), Step::Items(second)]));
        let query = SearchQuery::new("Jane Doe", "photo", 30);

        let result = aggregator(search)
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 18);
        let duplicates = result
            .skipped
            .iter()
            .filter(|s| s.reason == SkipReason::Duplicate)
            .count();
        assert_eq!(duplicates, 2);
    }

    #[tokio::test]
    async fn test_first_batch_failure_is_source_unavailable() {
        let search = Arc::new(ScriptedSearch::new(vec![Step::Fail]));
        let query = SearchQuery::new("Jane Doe", "photo", 20);

        let result = aggregator(search).aggregate(&query, &CancellationToken::new()).await;

        assert!(matches!(result, Err(DiscoveryError::SourceUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_later_batch_failure_keeps_partial_results() {
        let search = Arc::new(ScriptedSearch::new(vec![Step::Items(page(1, 10)), Step::Fail]));
        let query = SearchQuery::new("Jane Doe", "photo", 30);

        let result = aggregator(search)
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 10);
        assert_eq!(result.stop, StopReason::SourceError);
        assert!(result.stop.is_partial());
    }

    #[tokio::test]
    async fn test_timeout_on_first_batch_is_source_unavailable() {
        let search = Arc::new(ScriptedSearch::new(vec![Step::Hang]));
        let query = SearchQuery::new("Jane Doe", "photo", 10);

        let result = SearchAggregator::new(search)
            .with_batch_timeout(Duration::from_millis(20))
            .aggregate(&query, &CancellationToken::new())
            .await;

        match result {
            Err(DiscoveryError::SourceUnavailable { reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_after_first_batch_keeps_partial_results() {
        let search = Arc::new(ScriptedSearch::new(vec![Step::Items(page(1, 10)), Step::Hang]));
        let query = SearchQuery::new("Jane Doe", "photo", 30);

        let result = SearchAggregator::new(search)
            .with_batch_timeout(Duration::from_millis(20))
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.candidates.len(), 10);
        assert_eq!(result.stop, StopReason::SourceError);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_issues_no_batches() {
        let search = Arc::new(ScriptedSearch::endless());
        let query = SearchQuery::new("Jane Doe", "photo", 30);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = aggregator(search.clone()).aggregate(&query, &cancel).await.unwrap();

        assert!(search.calls().is_empty());
        assert!(result.candidates.is_empty());
        assert_eq!(result.stop, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn test_zero_target_issues_no_batches() {
        let search = Arc::new(ScriptedSearch::endless());
        let query = SearchQuery::new("Jane Doe", "photo", 0);

        let result = aggregator(search.clone())
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert!(search.calls().is_empty());
        assert_eq!(result.stop, StopReason::TargetReached);
    }

    #[tokio::test]
    async fn test_custom_page_size_and_ceiling() {
        let search = Arc::new(ScriptedSearch::endless());
        let query = SearchQuery::new("Jane Doe", "photo", 100);

        let result = aggregator(search.clone())
            .with_page_size(5)
            .with_offset_ceiling(11)
            .aggregate(&query, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(search.calls(), vec![(1, 5), (6, 5), (11, 5)]);
        assert_eq!(result.stop, StopReason::OffsetCeiling);
    }
}
