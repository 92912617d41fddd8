//! Filter for sources that must never be surfaced.
//!
//! A hard policy gate, independent of any scoring: a candidate whose source
//! domain is in the exclusion set (or is a subdomain of an entry) is dropped
//! in every policy mode.

use crate::traits::Filter;
use image_model::{Candidate, SkipReason};
use std::collections::HashSet;

/// Lowercase and strip a leading `www.` so entries and hosts compare equal.
fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().trim_end_matches('.').to_lowercase();
    d.strip_prefix("www.").unwrap_or(&d).to_string()
}

/// Removes candidates coming from excluded domains.
///
/// ## Algorithm
/// Walks the candidate's host suffixes (`a.b.example.com`, `b.example.com`,
/// `example.com`, `com`) and checks each against the normalized set.
pub struct ExcludedDomainFilter {
    excluded: HashSet<String>,
}

impl ExcludedDomainFilter {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = domains
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { excluded }
    }

    /// Whether a host is excluded, directly or as a subdomain.
    pub fn is_excluded(&self, domain: &str) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let host = normalize_domain(domain);
        let mut rest = host.as_str();
        loop {
            if rest.is_empty() {
                return false;
            }
            if self.excluded.contains(rest) {
                return true;
            }
            match rest.find('.') {
                Some(idx) => rest = &rest[idx + 1..],
                None => return false,
            }
        }
    }
}

impl Filter for ExcludedDomainFilter {
    fn name(&self) -> &str {
        "ExcludedDomainFilter"
    }

    fn check(&self, candidate: &Candidate) -> Result<(), SkipReason> {
        if self.is_excluded(&candidate.source_domain) {
            Err(SkipReason::ExcludedDomain(candidate.source_domain.clone()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_subdomain_matches() {
        let filter = ExcludedDomainFilter::new(["fbcdn.net", "WWW.Pinimg.com"]);

        assert!(filter.is_excluded("fbcdn.net"));
        assert!(filter.is_excluded("scontent-lax3-1.xx.fbcdn.net"));
        assert!(filter.is_excluded("www.fbcdn.net"));
        assert!(filter.is_excluded("i.pinimg.com"));
        assert!(!filter.is_excluded("notfbcdn.net"));
        assert!(!filter.is_excluded("example.com"));
        assert!(!filter.is_excluded(""));
    }

    #[test]
    fn test_filter_drops_excluded_sources() {
        let filter = ExcludedDomainFilter::new(["cdninstagram.com"]);

        let blocked = Candidate::new("https://x.example/a.jpg", 800, 800)
            .with_source_domain("scontent.cdninstagram.com");
        let allowed = Candidate::new("https://x.example/b.jpg", 800, 800)
            .with_source_domain("www.example.com");

        assert_eq!(
            filter.check(&blocked),
            Err(SkipReason::ExcludedDomain("scontent.cdninstagram.com".to_string()))
        );
        assert_eq!(filter.check(&allowed), Ok(()));
    }

    #[test]
    fn test_empty_exclusion_set_allows_everything() {
        let filter = ExcludedDomainFilter::new(Vec::<String>::new());
        assert!(!filter.is_excluded("fbcdn.net"));
    }
}
