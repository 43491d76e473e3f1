//! # tagsweep Core
//!
//! Core types and decisions for retiring old container image tags.
//!
//! This crate holds everything about a cleanup run that does not touch the
//! network:
//!
//! - [`TagRecord`] / [`Inventory`] - Tags with their parsed creation times
//! - [`RetentionPolicy`] - Splits an inventory into tags to keep and deletion candidates
//! - [`SkipPolicy`] - Per-backend rule for tags that must never be deleted
//! - [`DeletionOutcome`] - Result of one deletion attempt
//! - [`CleanupReport`] - The full report of a run, renderable as text or JSON
//!
//! ## Example
//!
//! ```rust
//! use chrono::DateTime;
//! use tagsweep_core::{Inventory, RetentionPolicy, SkipPolicy, TagRecord};
//!
//! let inventory = Inventory::from(vec![
//!     TagRecord::new("v1", DateTime::from_timestamp(100, 0)),
//!     TagRecord::new("sha-deadbee", DateTime::from_timestamp(300, 0)),
//!     TagRecord::new("v2", DateTime::from_timestamp(200, 0)),
//! ]);
//!
//! let decision = RetentionPolicy::new(1).apply(&inventory);
//! assert_eq!(decision.kept_names(), vec!["sha-deadbee"]);
//! assert_eq!(decision.candidate_names(), vec!["v2", "v1"]);
//!
//! let skips = SkipPolicy::CommitTag.evaluate_all(decision.candidates());
//! assert!(skips.iter().all(|s| !s.should_skip()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod outcome;
pub mod report;
pub mod retention;
pub mod safety;
pub mod tag;

#[cfg(test)]
mod proptest_tests;

pub use error::{Error, Result};
pub use outcome::{DeletionOutcome, DeletionResult, TagFailure};
pub use report::{CleanupReport, ReportSummary};
pub use retention::{RetentionDecision, RetentionPolicy};
pub use safety::{SkipDecision, SkipPolicy, SkipReason};
pub use tag::{Inventory, TagRecord};
