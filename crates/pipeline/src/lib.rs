//! Candidate assessment for image discovery.
//!
//! This crate provides:
//! - Filter trait and implementations for structural and domain gating
//! - FilterPipeline for composing filters
//! - SignalValidator for the per-candidate subject/appropriateness/relevance signals
//! - ContentMatchEngine for matching candidates against a content descriptor
//! - DecisionEngine and ranking for the final accept/reject and ordering
//! - PipelineStats for the run counters
//!
//! ## Architecture
//! The pipeline processes candidates in stages:
//! 1. Filters remove structurally invalid and excluded-domain candidates
//! 2. CandidateEvaluator computes signal outcomes concurrently
//! 3. ContentMatchEngine scores descriptor fit in parallel
//! 4. DecisionEngine applies the policy mode; survivors are ranked and truncated
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::filters::{ExcludedDomainFilter, StructuralFilter};
//! use pipeline::{CandidateEvaluator, ContentMatchEngine, DecisionEngine, FilterPipeline, SignalValidator};
//!
//! let filters = FilterPipeline::new()
//!     .add_filter(StructuralFilter)
//!     .add_filter(ExcludedDomainFilter::new(["fbcdn.net"]));
//! let report = filters.apply(candidates);
//!
//! let evaluation = CandidateEvaluator::new(SignalValidator::lexical())
//!     .evaluate_all(report.kept, "Jane Doe", false, &cancel)
//!     .await;
//! ```

pub mod content;
pub mod evaluate;
pub mod filter_pipeline;
pub mod filters;
pub mod fusion;
pub mod signals;
pub mod stats;
pub mod traits;

// Re-export main types
pub use content::{ContentMatchEngine, ContentMatcher, KeywordContentMatcher};
pub use evaluate::{CandidateEvaluator, Evaluation};
pub use filter_pipeline::{FilterPipeline, FilterReport};
pub use fusion::{Decision, DecisionEngine, ScoredCandidate, rank_and_select};
pub use signals::{LexicalSignalDetector, SignalDetector, SignalError, SignalValidator};
pub use stats::PipelineStats;
pub use traits::Filter;
