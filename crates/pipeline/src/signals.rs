//! Signal Validator.
//!
//! Produces three independent confidences per candidate (subject presence,
//! content appropriateness, relevance to the subject), thresholds them and
//! fuses them into one `content_score`.
//!
//! ## Architecture
//! - `SignalDetector` is the swappable capability: anything that can turn
//!   (candidate, subject) into three confidences
//! - `LexicalSignalDetector` is the shipped implementation. It reads URL cues
//!   only and does no image analysis
//! - `SignalValidator` owns thresholds, fusion weights and the fallback
//!   values used when a detector fails, so those never depend on the detector

use async_trait::async_trait;
use image_model::{Candidate, Confidence, SignalKind, ValidationOutcome};
use std::sync::Arc;
use tracing::warn;

// =============================================================================
// Thresholds and Weights
// =============================================================================

/// A subject counts as present above this confidence
pub const SUBJECT_PRESENCE_THRESHOLD: Confidence = 0.70;
/// Content counts as appropriate above this score
pub const APPROPRIATENESS_THRESHOLD: Confidence = 0.80;
/// A candidate counts as relevant above this score
pub const RELEVANCE_THRESHOLD: Confidence = 0.70;
/// The fused content score must exceed this for a candidate to be valid
pub const CONTENT_SCORE_THRESHOLD: Confidence = 0.60;

pub const SUBJECT_PRESENCE_WEIGHT: Confidence = 0.40;
pub const APPROPRIATENESS_WEIGHT: Confidence = 0.35;
pub const RELEVANCE_WEIGHT: Confidence = 0.25;

/// Fallbacks when a detector fails. Subject presence falls to zero so the
/// candidate cannot pass; appropriateness lands exactly on its threshold,
/// which does not pass either.
pub const FALLBACK_SUBJECT_PRESENCE: Confidence = 0.0;
pub const FALLBACK_APPROPRIATENESS: Confidence = 0.80;
pub const FALLBACK_RELEVANCE: Confidence = 0.80;

/// Weighted fusion of the three signals.
pub fn content_score(
    subject_presence: Confidence,
    appropriateness: Confidence,
    relevance: Confidence,
) -> Confidence {
    subject_presence * SUBJECT_PRESENCE_WEIGHT
        + appropriateness * APPROPRIATENESS_WEIGHT
        + relevance * RELEVANCE_WEIGHT
}

/// Threshold and fuse three signal values into an outcome.
pub fn build_outcome(
    subject_presence: Confidence,
    appropriateness: Confidence,
    relevance: Confidence,
    degraded: Vec<SignalKind>,
) -> ValidationOutcome {
    let subject_detected = subject_presence > SUBJECT_PRESENCE_THRESHOLD;
    let appropriate = appropriateness > APPROPRIATENESS_THRESHOLD;
    let relevant = relevance > RELEVANCE_THRESHOLD;
    let content_score = content_score(subject_presence, appropriateness, relevance);

    ValidationOutcome {
        subject_presence,
        appropriateness,
        relevance,
        subject_detected,
        appropriate,
        relevant,
        content_score,
        is_valid: subject_detected
            && appropriate
            && relevant
            && content_score > CONTENT_SCORE_THRESHOLD,
        degraded,
    }
}

// =============================================================================
// Detector Capability
// =============================================================================

/// Errors a detector may report for a single signal
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    #[error("Detector returned an invalid confidence: {0}")]
    InvalidConfidence(f32),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Produces the three per-candidate signals.
///
/// Implementations only report confidences in [0, 1]; thresholds, weights
/// and failure fallbacks are applied by `SignalValidator`.
#[async_trait]
pub trait SignalDetector: Send + Sync {
    /// Returns the name of this detector (for logging/debugging)
    fn name(&self) -> &str;

    /// Does the image plausibly depict a subject/face?
    async fn subject_presence(
        &self,
        candidate: &Candidate,
        subject: &str,
    ) -> Result<Confidence, SignalError>;

    /// Is the content safe to show?
    async fn appropriateness(&self, candidate: &Candidate) -> Result<Confidence, SignalError>;

    /// Is the image about this subject?
    async fn relevance(
        &self,
        candidate: &Candidate,
        subject: &str,
    ) -> Result<Confidence, SignalError>;
}

// =============================================================================
// Lexical Heuristic Detector
// =============================================================================

/// URL cues associated with portrait-style images
pub const PORTRAIT_CUES: [&str; 4] = ["face", "portrait", "headshot", "person"];

/// URL terms that mark content as not appropriate
pub const DISALLOWED_TERMS: [&str; 4] = ["adult", "nsfw", "explicit", "nude"];

/// Heuristic detector reading lexical cues from the candidate URL.
///
/// This is a stand-in for real face detection and content moderation: it
/// never looks at image bytes.
///
/// | signal | baseline | with cue |
/// |---|---|---|
/// | subject presence | 0.75 | 0.85 (portrait cue in URL) |
/// | appropriateness | 0.95 | 0.30 (disallowed term in URL) |
/// | relevance | 0.80 | 0.90 (subject name token, > 3 chars, in URL) |
#[derive(Debug, Clone, Default)]
pub struct LexicalSignalDetector;

impl LexicalSignalDetector {
    fn url_lower(candidate: &Candidate) -> String {
        candidate.url.to_lowercase()
    }

    /// Name tokens long enough to be meaningful in a URL
    fn name_tokens(subject: &str) -> Vec<String> {
        subject
            .to_lowercase()
            .split_whitespace()
            .filter(|token| token.chars().count() > 3)
            .map(|token| token.to_string())
            .collect()
    }
}

#[async_trait]
impl SignalDetector for LexicalSignalDetector {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn subject_presence(
        &self,
        candidate: &Candidate,
        _subject: &str,
    ) -> Result<Confidence, SignalError> {
        let url = Self::url_lower(candidate);
        let confidence = if PORTRAIT_CUES.iter().any(|cue| url.contains(cue)) {
            0.85
        } else {
            0.75
        };
        Ok(confidence)
    }

    async fn appropriateness(&self, candidate: &Candidate) -> Result<Confidence, SignalError> {
        let url = Self::url_lower(candidate);
        let score = if DISALLOWED_TERMS.iter().any(|term| url.contains(term)) {
            0.30
        } else {
            0.95
        };
        Ok(score)
    }

    async fn relevance(
        &self,
        candidate: &Candidate,
        subject: &str,
    ) -> Result<Confidence, SignalError> {
        let url = Self::url_lower(candidate);
        let score = if Self::name_tokens(subject).iter().any(|token| url.contains(token.as_str())) {
            0.90
        } else {
            0.80
        };
        Ok(score)
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Runs a detector and turns its confidences into a `ValidationOutcome`.
///
/// Never fails: a detector error or an out-of-range value is logged and the
/// signal falls back to its conservative default.
#[derive(Clone)]
pub struct SignalValidator {
    detector: Arc<dyn SignalDetector>,
}

impl SignalValidator {
    pub fn new(detector: Arc<dyn SignalDetector>) -> Self {
        Self { detector }
    }

    /// Validator backed by the lexical heuristics
    pub fn lexical() -> Self {
        Self::new(Arc::new(LexicalSignalDetector))
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Assess one candidate for one subject.
    pub async fn assess(&self, candidate: &Candidate, subject: &str) -> ValidationOutcome {
        let (presence, appropriateness, relevance) = futures::join!(
            self.detector.subject_presence(candidate, subject),
            self.detector.appropriateness(candidate),
            self.detector.relevance(candidate, subject),
        );

        let mut degraded = Vec::new();
        let presence = self.settle(
            SignalKind::SubjectPresence,
            presence,
            FALLBACK_SUBJECT_PRESENCE,
            candidate,
            &mut degraded,
        );
        let appropriateness = self.settle(
            SignalKind::Appropriateness,
            appropriateness,
            FALLBACK_APPROPRIATENESS,
            candidate,
            &mut degraded,
        );
        let relevance = self.settle(
            SignalKind::Relevance,
            relevance,
            FALLBACK_RELEVANCE,
            candidate,
            &mut degraded,
        );

        build_outcome(presence, appropriateness, relevance, degraded)
    }

    /// Accept a detector value or fall back, recording the degradation.
    fn settle(
        &self,
        kind: SignalKind,
        result: Result<Confidence, SignalError>,
        fallback: Confidence,
        candidate: &Candidate,
        degraded: &mut Vec<SignalKind>,
    ) -> Confidence {
        let error = match result {
            Ok(value) if value.is_finite() && (0.0..=1.0).contains(&value) => return value,
            Ok(value) => SignalError::InvalidConfidence(value),
            Err(err) => err,
        };
        warn!(
            detector = self.detector.name(),
            signal = %kind,
            url = %candidate.url,
            error = %error,
            fallback,
            "signal check failed, using fallback"
        );
        degraded.push(kind);
        fallback
    }
}
