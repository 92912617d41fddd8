//! Error types for the image discovery pipeline.
//!
//! Only one failure is ever surfaced by a pipeline run: the upstream search
//! source failing before it produced a single usable batch. Everything else
//! (short batches, later-batch failures, skipped items, degraded signals) is
//! absorbed into statistics.

use thiserror::Error;

/// Errors visible to callers of the discovery pipeline.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The search source failed on the first batch, before any candidate
    /// could be gathered.
    #[error("Image source unavailable for query '{query}': {reason}")]
    SourceUnavailable { query: String, reason: String },

    /// Configuration could not be read or is invalid.
    ///
    /// Only raised while building collaborators, never during a run.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DiscoveryError>;
