//! Per-tag results of a cleanup run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened to one deletion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeletionResult {
    /// The tag was removed from the registry.
    Deleted,
    /// The registry rejected the deletion or could not be reached.
    Failed(String),
    /// The tag was intentionally left in place.
    Skipped(String),
}

/// Outcome of one deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    /// Tag name.
    pub tag: String,
    /// Result of the attempt.
    pub result: DeletionResult,
}

impl DeletionOutcome {
    /// Records a successful deletion.
    #[must_use]
    pub fn deleted(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            result: DeletionResult::Deleted,
        }
    }

    /// Records a failed deletion.
    #[must_use]
    pub fn failed(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            result: DeletionResult::Failed(reason.into()),
        }
    }

    /// Records a skipped candidate.
    #[must_use]
    pub fn skipped(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            result: DeletionResult::Skipped(reason.into()),
        }
    }

    /// Returns true if the tag was deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self.result, DeletionResult::Deleted)
    }

    /// Returns true if the deletion failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.result, DeletionResult::Failed(_))
    }

    /// Returns true if the candidate was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.result, DeletionResult::Skipped(_))
    }
}

impl fmt::Display for DeletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            DeletionResult::Deleted => write!(f, "deleted {}", self.tag),
            DeletionResult::Failed(reason) => write!(f, "failed {}: {reason}", self.tag),
            DeletionResult::Skipped(reason) => write!(f, "skipped {}: {reason}", self.tag),
        }
    }
}

/// A tag that could not be inventoried.
///
/// Such tags are neither kept nor deleted in the run that saw the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFailure {
    /// Tag name as listed by the registry.
    pub tag: String,
    /// Underlying cause.
    pub reason: String,
}

impl TagFailure {
    /// Creates a failure record.
    #[must_use]
    pub fn new(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TagFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag, self.reason)
    }
}
