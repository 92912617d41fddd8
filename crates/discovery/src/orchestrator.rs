//! # Discovery Orchestrator
//!
//! This module coordinates the entire discovery pipeline:
//! 1. Aggregate candidates from the search source (batched, bounded)
//! 2. Apply the structural and excluded-domain filters
//! 3. Assess signals concurrently (plus reachability in strict mode)
//! 4. Match content descriptors (rayon, on the blocking pool)
//! 5. Decide per policy mode
//! 6. Rank, truncate and assemble statistics
//!
//! The only error a run returns is `DiscoveryError::SourceUnavailable`;
//! everything else is counted in `PipelineStats`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use image_model::{
    Candidate, ContentMatch, DiscoveryError, PolicyMode, Result, SearchQuery, StopReason,
};
use pipeline::content::DEFAULT_CONFIDENCE;
use pipeline::filters::{ExcludedDomainFilter, StructuralFilter, is_structurally_valid};
use pipeline::{
    CandidateEvaluator, ContentMatchEngine, ContentMatcher, DecisionEngine, FilterPipeline,
    PipelineStats, ScoredCandidate, SignalDetector, SignalValidator, rank_and_select,
};
use sources::{GoogleImageSearch, HttpReachability, ImageSearch, ReachabilityCheck, SearchAggregator};

use crate::config::{DiscoveryConfig, PipelineSettings};

/// Descriptor appended to the subject name for profile picture lookups
pub const PROFILE_DESCRIPTOR: &str = "portrait headshot professional photo";

/// Results requested for a profile picture lookup
pub const PROFILE_RESULTS: usize = 10;

const PLACEHOLDER_BASE: &str = "https://via.placeholder.com/400x400/4a5568/ffffff";

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Accepted candidates, best first, at most `max_results`
    pub candidates: Vec<ScoredCandidate>,
    /// Candidates produced by aggregation
    pub total_raw_found: usize,
    pub stats: PipelineStats,
    /// Why aggregation stopped
    pub stop: StopReason,
    /// Content descriptor of the query
    pub descriptor: String,
}

impl PipelineResult {
    /// Aggregation stopped before the target was reached
    pub fn is_partial(&self) -> bool {
        self.stop.is_partial()
    }

    pub fn stats_map(&self) -> BTreeMap<&'static str, usize> {
        self.stats.to_map()
    }

    /// One-line human summary of the run
    pub fn summary(&self) -> String {
        format!(
            "Found {} images matching '{}' with detected faces from {} total images",
            self.stats.final_approved, self.descriptor, self.stats.total_checked
        )
    }
}

/// Placeholder avatar URL built from the initials of the first two name words
pub fn placeholder_url(subject: &str) -> String {
    let initials: String = subject
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    format!("{}?text={}", PLACEHOLDER_BASE, initials)
}

/// Main orchestrator that coordinates the discovery pipeline
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    aggregator: SearchAggregator,
    filters: Arc<FilterPipeline>,
    validator: SignalValidator,
    matcher: ContentMatchEngine,
    reachability: Option<Arc<dyn ReachabilityCheck>>,
    settings: PipelineSettings,
}

impl DiscoveryOrchestrator {
    /// Create an orchestrator over any search source
    ///
    /// Uses the lexical signal detector, the keyword content matcher and
    /// no reachability check; replace them with the `with_*` methods.
    pub fn new(source: Arc<dyn ImageSearch>, config: &DiscoveryConfig) -> Result<Self> {
        config.validate()?;

        let filters = Arc::new(
            FilterPipeline::new()
                .add_filter(StructuralFilter)
                .add_filter(ExcludedDomainFilter::new(&config.pipeline.excluded_domains)),
        );

        Ok(Self {
            aggregator: SearchAggregator::from_settings(source, &config.search),
            filters,
            validator: SignalValidator::lexical(),
            matcher: ContentMatchEngine::keyword(),
            reachability: None,
            settings: config.pipeline.clone(),
        })
    }

    /// Create an orchestrator backed by Google Custom Search
    ///
    /// Also builds the HTTP reachability check when it is enabled.
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        config.validate_credentials()?;

        let google = GoogleImageSearch::new(config.search.clone())
            .map_err(|err| DiscoveryError::Config(format!("search client: {}", err)))?;
        let mut orchestrator = Self::new(Arc::new(google), config)?;

        if config.pipeline.check_reachability {
            let reachability = HttpReachability::new(config.pipeline.reachability_timeout())
                .map_err(|err| DiscoveryError::Config(format!("reachability client: {}", err)))?;
            orchestrator = orchestrator.with_reachability(Arc::new(reachability));
        }
        Ok(orchestrator)
    }

    pub fn with_detector(mut self, detector: Arc<dyn SignalDetector>) -> Self {
        self.validator = SignalValidator::new(detector);
        self
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn ContentMatcher>) -> Self {
        self.matcher = ContentMatchEngine::new(matcher);
        self
    }

    pub fn with_reachability(mut self, reachability: Arc<dyn ReachabilityCheck>) -> Self {
        self.reachability = Some(reachability);
        self
    }

    /// Configure the result cap
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.settings.max_results = max_results;
        self
    }

    /// Run the pipeline to completion
    pub async fn run(&self, query: &SearchQuery, mode: PolicyMode) -> Result<PipelineResult> {
        self.run_cancellable(query, mode, &CancellationToken::new()).await
    }

    /// Run the pipeline, stopping new batch and candidate work once `cancel` fires
    ///
    /// # Returns
    /// * `Ok(PipelineResult)` - possibly empty or partial
    /// * `Err(DiscoveryError::SourceUnavailable)` - the first search batch failed
    #[instrument(skip(self, query, mode, cancel), fields(subject = %query.subject_name, mode = %mode))]
    pub async fn run_cancellable(
        &self,
        query: &SearchQuery,
        mode: PolicyMode,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let mut stats = PipelineStats::new();

        // Aggregate
        let aggregation = self.aggregator.aggregate(query, cancel).await?;
        stats.total_raw_found = aggregation.candidates.len();
        stats.batches_fetched = aggregation.batches;
        for skip in &aggregation.skipped {
            stats.record_skip(&skip.reason);
        }
        info!(
            "Aggregated {} candidates in {} batches",
            aggregation.candidates.len(),
            aggregation.batches
        );

        // Structural + exclusion gates
        let report = self.filters.apply(aggregation.candidates);
        for skip in &report.skipped {
            stats.record_skip(&skip.reason);
        }
        info!(
            "Applied filters, candidates remaining: {}",
            report.kept.len()
        );

        // Signals
        let check_reachability = mode == PolicyMode::Strict && self.settings.check_reachability;
        let mut evaluator =
            CandidateEvaluator::new(self.validator.clone()).with_workers(self.settings.worker_count);
        if let Some(reachability) = &self.reachability {
            evaluator = evaluator.with_reachability(reachability.clone());
        }
        let evaluation = evaluator
            .evaluate_all(report.kept, &query.subject_name, check_reachability, cancel)
            .await;
        for skip in &evaluation.skipped {
            stats.record_skip(&skip.reason);
        }

        let (candidates, outcomes): (Vec<Candidate>, Vec<_>) =
            evaluation.assessed.into_iter().unzip();

        // Content
        let candidates = Arc::new(candidates);
        let matches = self
            .match_content(candidates.clone(), &query.content_descriptor, &mut stats)
            .await;

        // Decide
        let engine = DecisionEngine::new(mode);
        info!(
            detector = self.validator.detector_name(),
            matcher = self.matcher.matcher_name(),
            "Deciding {} candidates in {} mode",
            candidates.len(),
            engine.mode()
        );
        let mut accepted = Vec::new();
        for ((candidate, outcome), content) in candidates.iter().zip(outcomes).zip(matches) {
            stats.record_assessment(&outcome, &content);
            let decision = engine.decide(candidate, &outcome, &content);
            if decision.accepted {
                accepted.push(ScoredCandidate {
                    candidate: candidate.clone(),
                    outcome,
                    content,
                    fused_score: decision.fused_score,
                });
            }
        }

        stats.final_approved = accepted.len();
        let ranked = rank_and_select(accepted, self.settings.max_results);
        stats.returned = ranked.len();
        stats.partial_results = aggregation.stop.is_partial() as usize;
        stats.cancelled =
            (aggregation.stop == StopReason::Cancelled || evaluation.cancelled) as usize;

        if stats.cancelled == 1 {
            warn!("Run cancelled, returning {} decided candidates", ranked.len());
        }
        info!(
            "Approved {} of {} checked candidates, returning {} in {:.2?}",
            stats.final_approved,
            stats.total_checked,
            stats.returned,
            start_time.elapsed()
        );

        Ok(PipelineResult {
            candidates: ranked,
            total_raw_found: stats.total_raw_found,
            stats,
            stop: aggregation.stop,
            descriptor: query.content_descriptor.clone(),
        })
    }

    /// Match all candidates against the descriptor on the blocking pool
    ///
    /// If the matching task fails, every candidate gets an unmatched result
    /// at the default confidence and is counted as degraded.
    async fn match_content(
        &self,
        candidates: Arc<Vec<Candidate>>,
        descriptor: &str,
        stats: &mut PipelineStats,
    ) -> Vec<ContentMatch> {
        let engine = self.matcher.clone();
        let shared = candidates.clone();
        let owned_descriptor = descriptor.to_string();

        match tokio::task::spawn_blocking(move || engine.match_all(&shared, &owned_descriptor)).await {
            Ok(matches) => matches,
            Err(err) => {
                warn!(
                    error = %err,
                    matcher = self.matcher.matcher_name(),
                    "content matching task failed, {} candidates left unmatched",
                    candidates.len()
                );
                stats.degraded_content += candidates.len();
                candidates
                    .iter()
                    .map(|_| ContentMatch {
                        matched: false,
                        confidence: DEFAULT_CONFIDENCE,
                        matched_elements: BTreeSet::new(),
                        indicators: BTreeSet::new(),
                    })
                    .collect()
            }
        }
    }

    /// Find a profile picture URL for a subject
    ///
    /// Returns the first structurally valid candidate of a portrait search,
    /// or a placeholder built from the subject's initials when there is none
    /// or the search fails.
    pub async fn profile_picture(&self, subject: &str) -> String {
        let query = SearchQuery::new(subject, PROFILE_DESCRIPTOR, PROFILE_RESULTS);

        match self.aggregator.aggregate(&query, &CancellationToken::new()).await {
            Ok(aggregation) => {
                if let Some(found) = aggregation
                    .candidates
                    .into_iter()
                    .find(|candidate| is_structurally_valid(candidate))
                {
                    return found.url;
                }
                info!("No usable profile picture for '{}'", subject);
            }
            Err(err) => warn!(error = %err, "profile picture search failed"),
        }
        placeholder_url(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_initials() {
        assert_eq!(
            placeholder_url("jane doe"),
            "https://via.placeholder.com/400x400/4a5568/ffffff?text=JD"
        );
        assert!(placeholder_url("Mary Jane Watson").ends_with("?text=MJ"));
        assert!(placeholder_url("Cher").ends_with("?text=C"));
        assert!(placeholder_url("   ").ends_with("?text="));
    }

    #[test]
    fn test_summary_format() {
        let mut stats = PipelineStats::new();
        stats.final_approved = 3;
        stats.total_checked = 9;
        let result = PipelineResult {
            candidates: Vec::new(),
            total_raw_found: 10,
            stats,
            stop: StopReason::SourceExhausted,
            descriptor: "professional photo".to_string(),
        };

        assert_eq!(
            result.summary(),
            "Found 3 images matching 'professional photo' with detected faces from 9 total images"
        );
        assert!(result.is_partial());
    }
}
