//! Core traits for the candidate filtering stage.
//!
//! This module defines the Filter trait that allows composable,
//! extensible gates to be applied to candidates before any scoring.

use image_model::{Candidate, SkipReason};

/// Core trait for gating candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared across concurrent runs
/// - Filters only look at one candidate and never mutate it
/// - Rejection is a typed `SkipReason`, not an error: dropping candidates
///   is the expected, frequent outcome
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Decide whether a candidate passes this gate.
    ///
    /// # Returns
    /// * `Ok(())` - The candidate passes
    /// * `Err(SkipReason)` - Why the candidate is dropped
    fn check(&self, candidate: &Candidate) -> Result<(), SkipReason>;
}
