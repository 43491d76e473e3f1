//! Deletion dispatcher.
//!
//! Turns skip decisions into deletion outcomes. Every candidate gets
//! exactly one outcome, in candidate order. A failed deletion never stops
//! the others and nothing is retried or rolled back.

use futures::stream::{self, StreamExt};
use tagsweep_core::{DeletionOutcome, SkipDecision};
use tagsweep_registry::RegistryBackend;
use tokio::time::Instant;

/// Reason recorded for candidates in dry-run mode.
pub const DRY_RUN_REASON: &str = "dry run";

/// Reason recorded once the run deadline has passed.
pub const DEADLINE_REASON: &str = "run deadline exceeded";

/// Issues deletions for one run.
pub struct Dispatcher<'a> {
    backend: &'a dyn RegistryBackend,
    concurrency: usize,
    dry_run: bool,
    deadline: Option<Instant>,
}

impl<'a> Dispatcher<'a> {
    /// Creates a dispatcher over `backend`.
    pub fn new(backend: &'a dyn RegistryBackend, concurrency: usize) -> Self {
        Self {
            backend,
            concurrency: concurrency.max(1),
            dry_run: false,
            deadline: None,
        }
    }

    /// Plans deletions without calling the backend.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stops issuing deletions at `deadline`.
    #[must_use]
    pub const fn deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Dispatches every decision and returns the outcomes in the same order.
    pub async fn dispatch(&self, decisions: Vec<SkipDecision>) -> Vec<DeletionOutcome> {
        stream::iter(decisions)
            .map(|decision| self.dispatch_one(decision))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn dispatch_one(&self, decision: SkipDecision) -> DeletionOutcome {
        let tag = decision.tag.name().to_string();

        let outcome = if let Some(reason) = decision.skip {
            DeletionOutcome::skipped(tag, reason.to_string())
        } else if self.dry_run {
            DeletionOutcome::skipped(tag, DRY_RUN_REASON)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            DeletionOutcome::skipped(tag, DEADLINE_REASON)
        } else {
            self.delete(tag).await
        };

        log_outcome(&outcome);
        outcome
    }

    async fn delete(&self, tag: String) -> DeletionOutcome {
        let result = match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.backend.delete_tag(&tag)).await {
                    Ok(result) => result,
                    Err(_) => return DeletionOutcome::failed(tag, DEADLINE_REASON),
                }
            }
            None => self.backend.delete_tag(&tag).await,
        };

        match result {
            Ok(()) => DeletionOutcome::deleted(tag),
            Err(e) => DeletionOutcome::failed(tag, e.to_string()),
        }
    }
}

fn log_outcome(outcome: &DeletionOutcome) {
    use tagsweep_core::DeletionResult;

    match &outcome.result {
        DeletionResult::Deleted => tracing::info!(tag = %outcome.tag, "deleted tag"),
        DeletionResult::Skipped(reason) => {
            tracing::info!(tag = %outcome.tag, reason = %reason, "skipped tag");
        }
        DeletionResult::Failed(reason) => {
            tracing::warn!(tag = %outcome.tag, error = %reason, "failed to delete tag");
        }
    }
}
