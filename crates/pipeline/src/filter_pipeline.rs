//! The FilterPipeline orchestrates multiple gates.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::Filter;
use image_model::{Candidate, Skip};
use tracing;

/// Result of running candidates through the filter chain.
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    /// Candidates that passed every filter, in input order
    pub kept: Vec<Candidate>,
    /// Candidates dropped, with the reason from the first failing filter
    pub skipped: Vec<Skip>,
}

/// Chains multiple filters together into a gating stage.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(StructuralFilter)
///     .add_filter(ExcludedDomainFilter::new(["fbcdn.net"]));
///
/// let report = pipeline.apply(candidates);
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Apply all filters in order to every candidate.
    ///
    /// ## Algorithm
    /// 1. For each candidate, run the filters in the order they were added
    /// 2. The first failing filter decides the skip reason; later filters
    ///    are not consulted
    /// 3. Survivors keep their input order
    pub fn apply(&self, candidates: Vec<Candidate>) -> FilterReport {
        let input_count = candidates.len();
        let mut report = FilterReport::default();

        'candidates: for candidate in candidates {
            for filter in &self.filters {
                if let Err(reason) = filter.check(&candidate) {
                    tracing::trace!(
                        "{} dropped {}: {}",
                        filter.name(),
                        candidate.url,
                        reason
                    );
                    report.skipped.push(Skip::new(candidate.url, reason));
                    continue 'candidates;
                }
            }
            report.kept.push(candidate);
        }

        tracing::debug!(
            "Filter chain applied (input count: {}, kept: {}, skipped: {})",
            input_count,
            report.kept.len(),
            report.skipped.len()
        );
        report
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
