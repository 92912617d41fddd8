//! Structural Validator.
//!
//! Cheap pre-filter run before any signal work: a candidate needs a URL and
//! pixel dimensions inside [MIN_DIMENSION, MAX_DIMENSION] on both axes.
//! Anything smaller is useless as a photo; anything larger is most likely a
//! decorative asset or a bogus size report.

use crate::traits::Filter;
use image_model::{Candidate, SkipReason};

/// Smallest accepted width and height (inclusive)
pub const MIN_DIMENSION: u32 = 200;

/// Largest accepted width and height (inclusive)
pub const MAX_DIMENSION: u32 = 5000;

/// Check a candidate's structure, explaining any rejection.
pub fn structural_check(candidate: &Candidate) -> Result<(), SkipReason> {
    if candidate.url.trim().is_empty() {
        return Err(SkipReason::MissingUrl);
    }

    let (width, height) = (candidate.width, candidate.height);
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(SkipReason::TooSmall { width, height });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(SkipReason::TooLarge { width, height });
    }
    Ok(())
}

/// Pure yes/no form of `structural_check`.
pub fn is_structurally_valid(candidate: &Candidate) -> bool {
    structural_check(candidate).is_ok()
}

/// Drops candidates without a URL or with implausible dimensions.
pub struct StructuralFilter;

impl Filter for StructuralFilter {
    fn name(&self) -> &str {
        "StructuralFilter"
    }

    fn check(&self, candidate: &Candidate) -> Result<(), SkipReason> {
        structural_check(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(width: u32, height: u32) -> Candidate {
        Candidate::new("https://cdn.example.com/a.jpg", width, height)
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(is_structurally_valid(&sized(200, 200)));
        assert!(is_structurally_valid(&sized(5000, 5000)));
        assert!(is_structurally_valid(&sized(200, 5000)));
        assert!(is_structurally_valid(&sized(1024, 768)));
    }

    #[test]
    fn test_rejects_outside_bounds() {
        assert!(!is_structurally_valid(&sized(199, 800)));
        assert!(!is_structurally_valid(&sized(800, 199)));
        assert!(!is_structurally_valid(&sized(5001, 800)));
        assert!(!is_structurally_valid(&sized(800, 5001)));
        assert!(!is_structurally_valid(&sized(0, 0)));
    }

    #[test]
    fn test_every_dimension_pair_respects_bounds() {
        for width in [0, 1, 150, 199, 200, 201, 2500, 4999, 5000, 5001, 9000] {
            for height in [0, 199, 200, 3000, 5000, 5001] {
                let inside = (MIN_DIMENSION..=MAX_DIMENSION).contains(&width)
                    && (MIN_DIMENSION..=MAX_DIMENSION).contains(&height);
                assert_eq!(
                    is_structurally_valid(&sized(width, height)),
                    inside,
                    "{}x{}",
                    width,
                    height
                );
            }
        }
    }

    #[test]
    fn test_rejects_empty_url() {
        let candidate = Candidate::new("", 800, 600);
        assert_eq!(structural_check(&candidate), Err(SkipReason::MissingUrl));
    }

    #[test]
    fn test_reasons() {
        assert_eq!(
            structural_check(&sized(100, 900)),
            Err(SkipReason::TooSmall { width: 100, height: 900 })
        );
        assert_eq!(
            structural_check(&sized(6000, 900)),
            Err(SkipReason::TooLarge { width: 6000, height: 900 })
        );
    }
}
