//! Retention policy: which tags survive a run.
//!
//! The policy orders an [`Inventory`] newest first and keeps the first
//! `count` records. Everything else becomes a deletion candidate. The
//! decision is a pure function of the inventory and the count, so the same
//! input always produces the same partition.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::tag::{Inventory, TagRecord};

/// Maximum number of most recent tags to preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionPolicy {
    count: usize,
}

impl RetentionPolicy {
    /// Creates a policy keeping the `count` most recent tags.
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self { count }
    }

    /// Parses a retention count from user input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] for an empty value and
    /// [`Error::InvalidRetentionCount`] for anything that is not a
    /// non-negative integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_core::RetentionPolicy;
    ///
    /// assert_eq!(RetentionPolicy::parse("5").unwrap().count(), 5);
    /// assert!(RetentionPolicy::parse("-1").is_err());
    /// assert!(RetentionPolicy::parse("five").is_err());
    /// assert!(RetentionPolicy::parse("").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::MissingInput {
                name: "max-images".to_string(),
            });
        }

        if input
            .strip_prefix('-')
            .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(Error::InvalidRetentionCount {
                value: input.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        input
            .parse::<usize>()
            .map(Self::new)
            .map_err(|e| Error::InvalidRetentionCount {
                value: input.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the retention count.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Partitions an inventory into kept tags and deletion candidates.
    #[must_use]
    pub fn apply(&self, inventory: &Inventory) -> RetentionDecision {
        let mut ordered = inventory.sorted_newest_first().into_records();
        let split = self.count.min(ordered.len());
        let candidates = ordered.split_off(split);

        RetentionDecision {
            keep: ordered,
            candidates,
        }
    }
}

/// The partition produced by a [`RetentionPolicy`].
///
/// Both halves are ordered newest first. Every kept record is at least as
/// recent as every candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionDecision {
    keep: Vec<TagRecord>,
    candidates: Vec<TagRecord>,
}

impl RetentionDecision {
    /// Tags that survive the run.
    #[must_use]
    pub fn keep(&self) -> &[TagRecord] {
        &self.keep
    }

    /// Tags proposed for deletion.
    #[must_use]
    pub fn candidates(&self) -> &[TagRecord] {
        &self.candidates
    }

    /// Names of the kept tags.
    #[must_use]
    pub fn kept_names(&self) -> Vec<&str> {
        self.keep.iter().map(TagRecord::name).collect()
    }

    /// Names of the deletion candidates.
    #[must_use]
    pub fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(TagRecord::name).collect()
    }

    /// Splits the decision into its kept tags and candidates.
    #[must_use]
    pub fn into_parts(self) -> (Vec<TagRecord>, Vec<TagRecord>) {
        (self.keep, self.candidates)
    }
}
