//! Concurrent per-candidate assessment.
//!
//! Candidates are independent, so the signal checks (and the optional
//! reachability probe) run for up to `workers` candidates at a time. Results
//! come back in aggregation order.

use crate::signals::SignalValidator;
use futures::stream::{self, StreamExt};
use image_model::{Candidate, Skip, SkipReason, ValidationOutcome};
use sources::ReachabilityCheck;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

/// Default number of candidates assessed at once
pub const DEFAULT_WORKERS: usize = 8;

/// Result of assessing a batch of candidates.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Assessed candidates with their outcome, in input order
    pub assessed: Vec<(Candidate, ValidationOutcome)>,
    /// Candidates dropped before assessment (unreachable)
    pub skipped: Vec<Skip>,
    /// Cancellation was observed before every candidate was assessed
    pub cancelled: bool,
}

enum Assessed {
    Done(Candidate, ValidationOutcome),
    Skipped(Skip),
    Cancelled,
}

/// Runs the signal validator over many candidates concurrently.
#[derive(Clone)]
pub struct CandidateEvaluator {
    validator: SignalValidator,
    reachability: Option<Arc<dyn ReachabilityCheck>>,
    workers: usize,
}

impl CandidateEvaluator {
    pub fn new(validator: SignalValidator) -> Self {
        Self {
            validator,
            reachability: None,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Probe candidates with this check before assessing them
    pub fn with_reachability(mut self, reachability: Arc<dyn ReachabilityCheck>) -> Self {
        self.reachability = Some(reachability);
        self
    }

    /// Configure the concurrency bound (at least 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Assess every candidate for `subject`.
    ///
    /// When `check_reachability` is set and a check is configured,
    /// unreachable candidates are skipped instead of assessed. Cancellation
    /// is checked before each candidate starts; candidates already in flight
    /// finish normally.
    #[instrument(skip_all, fields(candidates = candidates.len(), workers = self.workers))]
    pub async fn evaluate_all(
        &self,
        candidates: Vec<Candidate>,
        subject: &str,
        check_reachability: bool,
        cancel: &CancellationToken,
    ) -> Evaluation {
        let reachability = if check_reachability {
            self.reachability.as_ref()
        } else {
            None
        };

        let results: Vec<Assessed> = stream::iter(candidates)
            .map(|candidate| async move {
                if cancel.is_cancelled() {
                    return Assessed::Cancelled;
                }
                if let Some(check) = reachability {
                    if !check.is_reachable(&candidate.url).await {
                        warn!(url = %candidate.url, "candidate unreachable, skipping");
                        return Assessed::Skipped(Skip::new(candidate.url, SkipReason::Unreachable));
                    }
                }
                let outcome = self.validator.assess(&candidate, subject).await;
                Assessed::Done(candidate, outcome)
            })
            .buffered(self.workers)
            .collect()
            .await;

        let mut evaluation = Evaluation::default();
        for result in results {
            match result {
                Assessed::Done(candidate, outcome) => evaluation.assessed.push((candidate, outcome)),
                Assessed::Skipped(skip) => evaluation.skipped.push(skip),
                Assessed::Cancelled => evaluation.cancelled = true,
            }
        }
        evaluation
    }
}
