//! Tagsweep cleanup engine
//!
//! This crate drives one cleanup run over a [`RegistryBackend`]:
//!
//! 1. **List** every tag of the repository (a failure aborts the run)
//! 2. **Inventory** each tag's creation time, isolating per-tag failures
//! 3. **Retain** the newest tags according to the [`RetentionPolicy`]
//! 4. **Filter** candidates through the backend's skip policy
//! 5. **Dispatch** deletions, recording one outcome per candidate
//!
//! # Example
//!
//! ```rust,no_run
//! use tagsweep_core::RetentionPolicy;
//! use tagsweep_engine::{Cleaner, CleanupOptions};
//! use tagsweep_registry::{select_backend, BackendSettings, RegistryKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = select_backend(&BackendSettings::new(RegistryKind::Ghcr, "acme/app"))?;
//!     let cleaner = Cleaner::new(backend, CleanupOptions::new(RetentionPolicy::new(5)))?;
//!
//!     let report = cleaner.run().await?;
//!     print!("{}", report.render_text());
//!     Ok(())
//! }
//! ```
//!
//! [`RetentionPolicy`]: tagsweep_core::RetentionPolicy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod listing;

pub use config::{CleanupOptions, DEFAULT_CONCURRENCY};
pub use dispatch::{Dispatcher, DEADLINE_REASON, DRY_RUN_REASON};
pub use error::{EngineError, Result};
pub use inventory::{build_inventory, InventoryResult};
pub use listing::Listing;

use tagsweep_core::{CleanupReport, SkipDecision};
use tagsweep_registry::RegistryBackend;
use tokio::time::Instant;

/// Runs cleanups against one backend.
pub struct Cleaner {
    backend: Box<dyn RegistryBackend>,
    options: CleanupOptions,
}

impl Cleaner {
    /// Creates a cleaner.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOptions`] if the options are invalid.
    pub fn new(backend: Box<dyn RegistryBackend>, options: CleanupOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { backend, options })
    }

    /// Returns the backend.
    pub fn backend(&self) -> &dyn RegistryBackend {
        self.backend.as_ref()
    }

    /// Returns the run options.
    pub const fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Performs a full cleanup run.
    ///
    /// Only a failure to list tags aborts the run. Unreadable tags and
    /// failed deletions are recorded in the report. The optional deadline
    /// bounds every phase: listing, metadata fetches and deletions.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ListFailed`] if the tag list cannot be
    /// retrieved, or [`EngineError::ListTimedOut`] if it does not arrive
    /// before the deadline.
    pub async fn run(&self) -> Result<CleanupReport> {
        let deadline = self.deadline();
        let repository = self.backend.repository().to_string();
        let retention = self.options.retention;

        tracing::info!(
            repository = %repository,
            backend = self.backend.name(),
            retention = retention.count(),
            skip_policy = %self.backend.skip_policy(),
            dry_run = self.options.dry_run,
            "starting cleanup"
        );

        let InventoryResult {
            inventory,
            failures,
        } = self.inventory(deadline).await?;

        let decision = retention.apply(&inventory);
        let kept: Vec<String> = decision.kept_names().into_iter().map(String::from).collect();
        let (_, candidates) = decision.into_parts();

        tracing::info!(
            repository = %repository,
            inventoried = inventory.len(),
            unreadable = failures.len(),
            kept = kept.len(),
            candidates = candidates.len(),
            "retention decided"
        );

        let decisions: Vec<SkipDecision> = candidates
            .iter()
            .map(|candidate| self.backend.should_skip(candidate))
            .collect();

        let outcomes = Dispatcher::new(self.backend.as_ref(), self.options.concurrency)
            .dry_run(self.options.dry_run)
            .deadline(deadline)
            .dispatch(decisions)
            .await;

        let report = CleanupReport {
            repository,
            retention: retention.count(),
            skip_policy: self.backend.skip_policy(),
            dry_run: self.options.dry_run,
            inventory: inventory.sorted_newest_first(),
            kept,
            failures,
            outcomes,
        };

        let summary = report.summary();
        tracing::info!(
            repository = %report.repository,
            deleted = summary.deleted,
            skipped = summary.skipped,
            failed = summary.failed,
            "cleanup finished"
        );

        Ok(report)
    }

    /// Lists the repository's tags without deleting anything.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ListFailed`] if the tag list cannot be
    /// retrieved, or [`EngineError::ListTimedOut`] past the deadline.
    pub async fn list(&self) -> Result<Listing> {
        let deadline = self.deadline();
        let InventoryResult {
            inventory,
            failures,
        } = self.inventory(deadline).await?;

        Ok(Listing {
            repository: self.backend.repository().to_string(),
            inventory: inventory.sorted_newest_first(),
            failures,
        })
    }

    fn deadline(&self) -> Option<Instant> {
        self.options.deadline.map(|d| Instant::now() + d)
    }

    async fn inventory(&self, deadline: Option<Instant>) -> Result<InventoryResult> {
        let repository = || self.backend.repository().to_string();

        let listed = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.backend.list_tags())
                .await
                .map_err(|_| EngineError::ListTimedOut {
                    repository: repository(),
                })?,
            None => self.backend.list_tags().await,
        };
        let tags = listed.map_err(|source| EngineError::ListFailed {
            repository: repository(),
            source,
        })?;

        tracing::debug!(tags = tags.len(), "listed tags");
        Ok(build_inventory(self.backend.as_ref(), tags, self.options.concurrency, deadline).await)
    }
}
