//! Run statistics.
//!
//! Every non-error degradation of a run (skipped items, partial
//! aggregation, signal fallbacks, cancellation) ends up as a counter here.

use image_model::{ContentMatch, SkipReason, ValidationOutcome};
use serde::Serialize;
use std::collections::BTreeMap;

/// Named counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    // Aggregation
    pub total_raw_found: usize,
    pub batches_fetched: usize,
    pub discarded_raw: usize,
    pub duplicates: usize,

    // Gating
    pub skipped_structural: usize,
    pub skipped_excluded_domain: usize,
    pub skipped_unreachable: usize,

    // Assessment
    pub total_checked: usize,
    pub subject_presence_passed: usize,
    pub appropriateness_passed: usize,
    pub relevance_passed: usize,
    pub content_matched: usize,
    pub degraded_signals: usize,
    /// Candidates whose content match fell back after a matcher failure
    pub degraded_content: usize,
    /// Accepted by the policy mode, before the result cap
    pub final_approved: usize,
    /// Accepted candidates left after the result cap
    pub returned: usize,

    // Flags (0 or 1)
    pub partial_results: usize,
    pub cancelled: usize,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a skipped item under the counter matching its reason.
    pub fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::MissingUrl | SkipReason::UnrecognizedFormat => self.discarded_raw += 1,
            SkipReason::Duplicate => self.duplicates += 1,
            SkipReason::TooSmall { .. } | SkipReason::TooLarge { .. } => {
                self.skipped_structural += 1
            }
            SkipReason::ExcludedDomain(_) => self.skipped_excluded_domain += 1,
            SkipReason::Unreachable => self.skipped_unreachable += 1,
        }
    }

    /// Count one assessed candidate.
    pub fn record_assessment(&mut self, outcome: &ValidationOutcome, content: &ContentMatch) {
        self.total_checked += 1;
        if outcome.subject_detected {
            self.subject_presence_passed += 1;
        }
        if outcome.appropriate {
            self.appropriateness_passed += 1;
        }
        if outcome.relevant {
            self.relevance_passed += 1;
        }
        if content.matched {
            self.content_matched += 1;
        }
        self.degraded_signals += outcome.degraded.len();
    }

    /// Flatten into a name -> count mapping
    pub fn to_map(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("total_raw_found", self.total_raw_found),
            ("batches_fetched", self.batches_fetched),
            ("discarded_raw", self.discarded_raw),
            ("duplicates", self.duplicates),
            ("skipped_structural", self.skipped_structural),
            ("skipped_excluded_domain", self.skipped_excluded_domain),
            ("skipped_unreachable", self.skipped_unreachable),
            ("total_checked", self.total_checked),
            ("subject_presence_passed", self.subject_presence_passed),
            ("appropriateness_passed", self.appropriateness_passed),
            ("relevance_passed", self.relevance_passed),
            ("content_matched", self.content_matched),
            ("degraded_signals", self.degraded_signals),
            ("degraded_content", self.degraded_content),
            ("final_approved", self.final_approved),
            ("returned", self.returned),
            ("partial_results", self.partial_results),
            ("cancelled", self.cancelled),
        ])
    }
}
