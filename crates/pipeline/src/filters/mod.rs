//! Filter implementations for the gating stage.
//!
//! This module contains all the concrete filters that can be composed
//! into a FilterPipeline.

pub mod excluded_domain;
pub mod structural;

// Re-export for convenience
pub use excluded_domain::ExcludedDomainFilter;
pub use structural::{MAX_DIMENSION, MIN_DIMENSION, StructuralFilter, is_structurally_valid};
