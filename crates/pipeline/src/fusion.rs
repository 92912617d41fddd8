//! Score Fusion & Decision Engine.
//!
//! Combines the signal outcome and the content match of a candidate into one
//! accept/reject decision and one ranking score, according to the policy
//! mode chosen for the run.
//!
//! | mode | accepted iff | fused score |
//! |---|---|---|
//! | strict | `outcome.is_valid && content.matched` | `(content_score + confidence) / 2` |
//! | permissive | structural gate passed | `0.0` (order of aggregation) |

use crate::filters::is_structurally_valid;
use image_model::{Candidate, Confidence, ContentMatch, PolicyMode, ValidationOutcome};
use serde::Serialize;

/// Accept/reject plus ranking score for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub accepted: bool,
    pub fused_score: Confidence,
}

/// A candidate with everything the pipeline derived about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub outcome: ValidationOutcome,
    pub content: ContentMatch,
    pub fused_score: Confidence,
}

/// Applies one policy mode to assessed candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine {
    mode: PolicyMode,
}

impl DecisionEngine {
    pub fn new(mode: PolicyMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// Decide on one candidate.
    pub fn decide(
        &self,
        candidate: &Candidate,
        outcome: &ValidationOutcome,
        content: &ContentMatch,
    ) -> Decision {
        match self.mode {
            PolicyMode::Strict => Decision {
                accepted: outcome.is_valid && content.matched,
                fused_score: (outcome.content_score + content.confidence) / 2.0,
            },
            PolicyMode::Permissive => Decision {
                accepted: is_structurally_valid(candidate),
                fused_score: 0.0,
            },
        }
    }
}

/// Sort accepted candidates by fused score (highest first) and keep the top `limit`.
///
/// The sort is stable: equal scores keep their aggregation order, so identical
/// inputs always rank identically. A NaN score ranks below every number.
pub fn rank_and_select(mut scored: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    fn rank_key(score: Confidence) -> Confidence {
        if score.is_nan() { Confidence::NEG_INFINITY } else { score }
    }
    scored.sort_by(|a, b| rank_key(b.fused_score).total_cmp(&rank_key(a.fused_score)));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::build_outcome;
    use std::collections::BTreeSet;

    fn content(confidence: Confidence) -> ContentMatch {
        ContentMatch {
            matched: confidence > 0.65,
            confidence,
            matched_elements: BTreeSet::new(),
            indicators: BTreeSet::new(),
        }
    }

    fn scored(url: &str, fused_score: Confidence) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate::new(url, 800, 600),
            outcome: build_outcome(0.75, 0.95, 0.80, Vec::new()),
            content: content(0.8),
            fused_score,
        }
    }

    #[test]
    fn test_strict_accepts_only_when_both_gates_pass() {
        let engine = DecisionEngine::new(PolicyMode::Strict);
        let candidate = Candidate::new("https://a.example/x.jpg", 800, 600);

        let valid = build_outcome(0.75, 0.95, 0.80, Vec::new());
        let invalid = build_outcome(0.75, 0.30, 0.80, Vec::new());

        for outcome in [&valid, &invalid] {
            for confidence in [0.5, 0.8] {
                let matched = content(confidence);
                let decision = engine.decide(&candidate, outcome, &matched);
                assert_eq!(decision.accepted, outcome.is_valid && matched.matched);
            }
        }
    }

    #[test]
    fn test_strict_fused_score_is_mean() {
        let engine = DecisionEngine::new(PolicyMode::Strict);
        let candidate = Candidate::new("https://a.example/x.jpg", 800, 600);
        let outcome = build_outcome(0.75, 0.95, 0.80, Vec::new());

        let decision = engine.decide(&candidate, &outcome, &content(0.8));
        assert!((decision.fused_score - (outcome.content_score + 0.8) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_permissive_ignores_signals() {
        let engine = DecisionEngine::new(PolicyMode::Permissive);
        let invalid = build_outcome(0.0, 0.30, 0.0, Vec::new());

        let ok = Candidate::new("https://a.example/x.jpg", 800, 600);
        let decision = engine.decide(&ok, &invalid, &content(0.1));
        assert!(decision.accepted);
        assert_eq!(decision.fused_score, 0.0);

        let tiny = Candidate::new("https://a.example/y.jpg", 50, 50);
        assert!(!engine.decide(&tiny, &invalid, &content(0.9)).accepted);
    }

    #[test]
    fn test_ranking_sorts_descending_and_truncates() {
        let ranked = rank_and_select(
            vec![scored("a", 0.70), scored("b", 0.90), scored("c", 0.80)],
            2,
        );
        let urls: Vec<&str> = ranked.iter().map(|s| s.candidate.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "c"]);
    }

    #[test]
    fn test_ranking_is_stable_on_ties() {
        let input = vec![
            scored("first", 0.8),
            scored("second", 0.9),
            scored("third", 0.8),
            scored("fourth", 0.8),
        ];

        let once = rank_and_select(input.clone(), 10);
        let twice = rank_and_select(input, 10);

        let urls: Vec<&str> = once.iter().map(|s| s.candidate.url.as_str()).collect();
        assert_eq!(urls, vec!["second", "first", "third", "fourth"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nan_scores_rank_last_without_panicking() {
        let mut input = vec![scored("nan-1", f32::NAN), scored("a", 0.7)];
        input.extend((0..30).map(|i| scored(&format!("n{}", i), if i % 3 == 0 { f32::NAN } else { 0.5 })));
        input.push(scored("b", 0.9));

        let ranked = rank_and_select(input, 3);
        let urls: Vec<&str> = ranked.iter().map(|s| s.candidate.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "a", "n1"]);
    }

    #[test]
    fn test_all_zero_scores_keep_input_order() {
        let input: Vec<ScoredCandidate> = (0..5).map(|i| scored(&i.to_string(), 0.0)).collect();
        let ranked = rank_and_select(input, 12);
        let urls: Vec<&str> = ranked.iter().map(|s| s.candidate.url.as_str()).collect();
        assert_eq!(urls, vec!["0", "1", "2", "3", "4"]);
    }
}
