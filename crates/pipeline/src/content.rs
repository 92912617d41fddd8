//! Domain Matcher - content descriptor matching.
//!
//! Scores how well a candidate fits a free-text content descriptor such as
//! "professional high quality photo".
//!
//! ## Algorithm
//! 1. Tokenize the descriptor into lowercase keywords
//! 2. For each keyword class the descriptor triggers (professional,
//!    photo, quality), test the candidate URL against that class's cues and
//!    record the class's hit or miss confidence
//! 3. Overall confidence = mean of the recorded confidences, or 0.70 when
//!    no class was triggered
//! 4. `matched` = confidence > 0.65
//!
//! `ContentMatcher` is the seam for replacing this with a real content
//! classifier; `ContentMatchEngine` runs any matcher over a batch in parallel.

use image_model::{Candidate, Confidence, ContentMatch};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// Confidence used when the descriptor triggers no known class
pub const DEFAULT_CONFIDENCE: Confidence = 0.70;

/// Content counts as matched above this confidence
pub const MATCH_THRESHOLD: Confidence = 0.65;

/// One keyword class of the descriptor vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct CueClass {
    /// Descriptor keyword that activates this class
    pub trigger: &'static str,
    /// Name recorded in `matched_elements` when a cue is found
    pub element: &'static str,
    /// URL substrings that satisfy the class
    pub cues: &'static [&'static str],
    pub hit: Confidence,
    pub miss: Confidence,
}

pub const CUE_CLASSES: [CueClass; 3] = [
    CueClass {
        trigger: "professional",
        element: "professional_quality",
        cues: &["photoshoot", "portrait", "professional", "studio"],
        hit: 0.90,
        miss: 0.70,
    },
    CueClass {
        trigger: "photo",
        element: "photo_format",
        cues: &["photo", "image", "pic", "jpg", "jpeg", "png"],
        hit: 0.95,
        miss: 0.80,
    },
    CueClass {
        trigger: "quality",
        element: "high_quality",
        cues: &["getty", "shutterstock", "unsplash", "pexels"],
        hit: 0.90,
        miss: 0.75,
    },
];

const QUALITY_INDICATORS: [&str; 5] = ["hd", "high-res", "professional", "studio", "photoshoot"];
const FORMAT_INDICATORS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const SOURCE_INDICATORS: [&str; 5] = ["getty", "shutterstock", "unsplash", "pexels", "pixabay"];

/// Split a descriptor into lowercase alphanumeric keywords.
pub fn tokenize(descriptor: &str) -> Vec<String> {
    descriptor
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}

/// Content hints found in a (lowercased) URL.
pub fn url_indicators(url_lower: &str) -> BTreeSet<String> {
    let mut indicators = BTreeSet::new();
    for term in QUALITY_INDICATORS {
        if url_lower.contains(term) {
            indicators.insert(format!("quality_{}", term));
        }
    }
    for term in FORMAT_INDICATORS {
        if url_lower.contains(term) {
            indicators.insert(format!("format_{}", term));
        }
    }
    for term in SOURCE_INDICATORS {
        if url_lower.contains(term) {
            indicators.insert(format!("source_{}", term));
        }
    }
    indicators
}

/// Matches candidates against a content descriptor.
pub trait ContentMatcher: Send + Sync {
    /// Returns the name of this matcher (for logging/debugging)
    fn name(&self) -> &str;

    fn match_content(&self, candidate: &Candidate, descriptor: &str) -> ContentMatch;
}

/// Keyword-table matcher over the candidate URL.
#[derive(Debug, Clone, Default)]
pub struct KeywordContentMatcher;

impl ContentMatcher for KeywordContentMatcher {
    fn name(&self) -> &str {
        "keyword"
    }

    fn match_content(&self, candidate: &Candidate, descriptor: &str) -> ContentMatch {
        let keywords = tokenize(descriptor);
        let url_lower = candidate.url.to_lowercase();

        let mut matched_elements = BTreeSet::new();
        let mut scores: Vec<Confidence> = Vec::new();

        for class in CUE_CLASSES.iter() {
            if !keywords.iter().any(|k| k.contains(class.trigger)) {
                continue;
            }
            if class.cues.iter().any(|cue| url_lower.contains(cue)) {
                matched_elements.insert(class.element.to_string());
                scores.push(class.hit);
            } else {
                scores.push(class.miss);
            }
        }

        let confidence = if scores.is_empty() {
            DEFAULT_CONFIDENCE
        } else {
            scores.iter().sum::<Confidence>() / scores.len() as Confidence
        };

        ContentMatch {
            matched: confidence > MATCH_THRESHOLD,
            confidence,
            matched_elements,
            indicators: url_indicators(&url_lower),
        }
    }
}

/// Computes content matches for candidates in parallel.
///
/// ## Performance Note
/// Uses Rayon; matching is pure and independent per candidate.
#[derive(Clone)]
pub struct ContentMatchEngine {
    matcher: Arc<dyn ContentMatcher>,
}

impl ContentMatchEngine {
    pub fn new(matcher: Arc<dyn ContentMatcher>) -> Self {
        Self { matcher }
    }

    /// Engine backed by the keyword tables
    pub fn keyword() -> Self {
        Self::new(Arc::new(KeywordContentMatcher))
    }

    pub fn matcher_name(&self) -> &str {
        self.matcher.name()
    }

    /// Match all candidates against the descriptor.
    ///
    /// A non-finite confidence becomes an unmatched 0.0; anything else is
    /// clamped to [0, 1].
    ///
    /// # Returns
    /// One `ContentMatch` per candidate, in the same order
    pub fn match_all(&self, candidates: &[Candidate], descriptor: &str) -> Vec<ContentMatch> {
        candidates
            .par_iter()
            .map(|candidate| {
                let result = self.matcher.match_content(candidate, descriptor);
                self.sanitize(candidate, result)
            })
            .collect()
    }

    fn sanitize(&self, candidate: &Candidate, mut result: ContentMatch) -> ContentMatch {
        if !result.confidence.is_finite() {
            warn!(
                matcher = self.matcher.name(),
                url = %candidate.url,
                "non-finite content confidence {}",
                result.confidence
            );
            result.confidence = 0.0;
            result.matched = false;
        } else if !(0.0..=1.0).contains(&result.confidence) {
            result.confidence = result.confidence.clamp(0.0, 1.0);
        }
        result
    }
}
