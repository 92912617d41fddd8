//! Core domain types for image discovery.
//!
//! This module defines the data structures that flow through the pipeline:
//! - `RawImageRecord`: one item exactly as the search source returned it
//! - `Candidate`: a normalized, immutable prospective image result
//! - `ValidationOutcome` / `ContentMatch`: derived scores attached downstream
//! - `SkipReason` / `StopReason`: typed outcomes for the non-error paths

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// A confidence value in [0, 1]
pub type Confidence = f32;

// =============================================================================
// Search-side Types
// =============================================================================

/// One image result as delivered by the search source, before normalization.
///
/// Every field is optional in practice; missing values arrive as empty
/// strings or zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawImageRecord {
    pub link: String,
    pub title: String,
    pub thumbnail_link: String,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    /// Page the image was found on
    pub context_link: String,
    /// Host of the originating page as shown by the source (e.g. "www.example.com")
    pub display_link: String,
    pub mime_type: String,
}

/// What the caller is looking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub subject_name: String,
    /// Free-text description of the wanted content ("professional high quality photo")
    pub content_descriptor: String,
    /// Advisory: the aggregator may return fewer if the source runs dry
    pub target_count: usize,
}

impl SearchQuery {
    pub fn new(
        subject_name: impl Into<String>,
        content_descriptor: impl Into<String>,
        target_count: usize,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            content_descriptor: content_descriptor.into(),
            target_count,
        }
    }

    /// The query string sent to the search source: subject then descriptor.
    pub fn search_terms(&self) -> String {
        format!(
            "{} {}",
            self.subject_name.trim(),
            self.content_descriptor.trim()
        )
        .trim()
        .to_string()
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// A prospective image result.
///
/// Produced once by the aggregator and never mutated afterwards; later stages
/// wrap it together with their derived scores instead of editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub thumbnail_url: String,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pub context_url: String,
    /// Host of the originating page, without scheme
    pub source_domain: String,
    pub mime_type: String,
}

impl Candidate {
    /// Create a candidate with only a URL and dimensions set.
    ///
    /// Mostly useful for tests and fixtures; real candidates come out of
    /// `normalize::normalize_record`.
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            thumbnail_url: String::new(),
            width,
            height,
            byte_size: 0,
            context_url: String::new(),
            source_domain: String::new(),
            mime_type: String::new(),
        }
    }

    /// Builder-style setter for the source domain
    pub fn with_source_domain(mut self, domain: impl Into<String>) -> Self {
        self.source_domain = domain.into();
        self
    }

    /// Builder-style setter for the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

// =============================================================================
// Derived Scores
// =============================================================================

/// The three independent signals assessed per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalKind {
    SubjectPresence,
    Appropriateness,
    Relevance,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::SubjectPresence => "subject_presence",
            SignalKind::Appropriateness => "appropriateness",
            SignalKind::Relevance => "relevance",
        };
        f.write_str(name)
    }
}

/// Signal assessment attached to a candidate.
///
/// Computed once per candidate per run and never cached across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub subject_presence: Confidence,
    pub appropriateness: Confidence,
    pub relevance: Confidence,

    /// Thresholded signals
    pub subject_detected: bool,
    pub appropriate: bool,
    pub relevant: bool,

    /// Weighted fusion of the three signals
    pub content_score: Confidence,
    pub is_valid: bool,

    /// Signals that fell back to their conservative default
    pub degraded: Vec<SignalKind>,
}

/// How well a candidate matches the free-text content descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMatch {
    pub matched: bool,
    pub confidence: Confidence,
    /// Keyword classes whose cues were found ("professional_quality", ...)
    pub matched_elements: BTreeSet<String>,
    /// Content hints spotted in the URL ("format_jpg", "source_getty", ...)
    pub indicators: BTreeSet<String>,
}

// =============================================================================
// Policy and Outcome Types
// =============================================================================

/// Accept policy for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Accept only candidates passing every signal gate and the content match
    #[default]
    Strict,
    /// Accept everything that passed the structural gate, unranked
    Permissive,
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Strict => f.write_str("strict"),
            PolicyMode::Permissive => f.write_str("permissive"),
        }
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(PolicyMode::Strict),
            "permissive" => Ok(PolicyMode::Permissive),
            other => Err(format!("unknown policy mode '{}'", other)),
        }
    }
}

/// Why a raw item or candidate was dropped without being an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    MissingUrl,
    UnrecognizedFormat,
    Duplicate,
    TooSmall { width: u32, height: u32 },
    TooLarge { width: u32, height: u32 },
    ExcludedDomain(String),
    Unreachable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingUrl => write!(f, "missing url"),
            SkipReason::UnrecognizedFormat => write!(f, "unrecognized image format"),
            SkipReason::Duplicate => write!(f, "duplicate url"),
            SkipReason::TooSmall { width, height } => write!(f, "too small ({}x{})", width, height),
            SkipReason::TooLarge { width, height } => write!(f, "too large ({}x{})", width, height),
            SkipReason::ExcludedDomain(domain) => write!(f, "excluded domain {}", domain),
            SkipReason::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// A dropped item together with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skip {
    pub url: String,
    pub reason: SkipReason,
}

impl Skip {
    pub fn new(url: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            url: url.into(),
            reason,
        }
    }
}

/// Why aggregation stopped asking the source for more batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Enough candidates were gathered
    TargetReached,
    /// A batch came back smaller than requested
    SourceExhausted,
    /// The next start offset would pass the upstream ceiling
    OffsetCeiling,
    /// A batch after the first one failed or timed out
    SourceError,
    /// The caller cancelled the run
    Cancelled,
}

impl StopReason {
    /// Anything but reaching the target means the result set is partial.
    pub fn is_partial(&self) -> bool {
        !matches!(self, StopReason::TargetReached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_terms_joins_subject_and_descriptor() {
        let query = SearchQuery::new("  Jane Doe ", "professional photo ", 20);
        assert_eq!(query.search_terms(), "Jane Doe professional photo");

        let bare = SearchQuery::new("Jane Doe", "", 20);
        assert_eq!(bare.search_terms(), "Jane Doe");
    }

    #[test]
    fn test_policy_mode_parsing() {
        assert_eq!("strict".parse::<PolicyMode>(), Ok(PolicyMode::Strict));
        assert_eq!(" Permissive ".parse::<PolicyMode>(), Ok(PolicyMode::Permissive));
        assert!("lenient".parse::<PolicyMode>().is_err());
        assert_eq!(PolicyMode::default(), PolicyMode::Strict);
    }

    #[test]
    fn test_stop_reason_partial() {
        assert!(!StopReason::TargetReached.is_partial());
        assert!(StopReason::SourceExhausted.is_partial());
        assert!(StopReason::OffsetCeiling.is_partial());
        assert!(StopReason::SourceError.is_partial());
        assert!(StopReason::Cancelled.is_partial());
    }

    #[test]
    fn test_policy_mode_serde_lowercase() {
        let json = serde_json::to_string(&PolicyMode::Permissive).unwrap();
        assert_eq!(json, "\"permissive\"");
    }
}
