//! # Image Model Crate
//!
//! Shared domain types for the image discovery pipeline.
//!
//! ## Main Components
//!
//! - **types**: `RawImageRecord`, `Candidate`, `SearchQuery`, derived score
//!   types and the typed skip/stop outcomes
//! - **normalize**: turn raw search records into candidates
//! - **error**: the caller-visible error taxonomy
//!
//! ## Example Usage
//!
//! ```ignore
//! use image_model::{normalize::normalize_record, RawImageRecord};
//!
//! match normalize_record(raw) {
//!     Ok(candidate) => println!("{} from {}", candidate.url, candidate.source_domain),
//!     Err(reason) => println!("skipped: {}", reason),
//! }
//! ```

// Public modules
pub mod error;
pub mod normalize;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DiscoveryError, Result};
pub use types::{
    // Type aliases
    Confidence,
    // Core types
    Candidate,
    ContentMatch,
    RawImageRecord,
    SearchQuery,
    ValidationOutcome,
    // Enums and outcomes
    PolicyMode,
    SignalKind,
    Skip,
    SkipReason,
    StopReason,
};
