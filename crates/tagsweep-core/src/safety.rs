//! Deletion safety filter.
//!
//! Some tag shapes must never be deleted, and which ones depends on the
//! registry backend. A [`SkipPolicy`] is chosen per backend and turns each
//! deletion candidate into a [`SkipDecision`]. Skips are advisory: they are
//! reported, never retried, and never treated as failures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tag::TagRecord;

/// Prefix carried by digest-like and commit-derived tags.
pub const SHA_PREFIX: &str = "sha-";

/// Shortest abbreviated commit hash accepted as a commit-derived tag.
pub const MIN_COMMIT_HEX_LEN: usize = 7;

/// Rule deciding which deletion candidates are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipPolicy {
    /// Skip every tag starting with `sha-`.
    ///
    /// Used for registries that cannot delete digest-like tags by name.
    DigestPrefix,

    /// Skip only `sha-` followed by at least seven hex characters.
    ///
    /// Used for registries that can delete such tags, where the prefix
    /// encodes the git commit a build came from.
    CommitTag,
}

impl SkipPolicy {
    /// Returns the reason a tag must be skipped, or `None` if it may be deleted.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_core::{SkipPolicy, SkipReason};
    ///
    /// assert_eq!(SkipPolicy::CommitTag.check("sha-abc123d"), Some(SkipReason::CommitTag));
    /// assert_eq!(SkipPolicy::CommitTag.check("sha-1"), None);
    /// assert_eq!(SkipPolicy::DigestPrefix.check("sha-1"), Some(SkipReason::DigestLike));
    /// assert_eq!(SkipPolicy::DigestPrefix.check("latest"), None);
    /// ```
    #[must_use]
    pub fn check(&self, tag: &str) -> Option<SkipReason> {
        match self {
            Self::DigestPrefix => tag.starts_with(SHA_PREFIX).then_some(SkipReason::DigestLike),
            Self::CommitTag => is_commit_tag(tag).then_some(SkipReason::CommitTag),
        }
    }

    /// Evaluates one candidate.
    #[must_use]
    pub fn evaluate(&self, record: &TagRecord) -> SkipDecision {
        SkipDecision {
            tag: record.clone(),
            skip: self.check(record.name()),
        }
    }

    /// Evaluates every candidate, preserving order.
    #[must_use]
    pub fn evaluate_all(&self, candidates: &[TagRecord]) -> Vec<SkipDecision> {
        candidates.iter().map(|c| self.evaluate(c)).collect()
    }

    /// Returns the policy name as used on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DigestPrefix => "digest-prefix",
            Self::CommitTag => "commit-tag",
        }
    }
}

/// `sha-` followed by at least [`MIN_COMMIT_HEX_LEN`] hex characters and nothing else.
fn is_commit_tag(tag: &str) -> bool {
    tag.strip_prefix(SHA_PREFIX).is_some_and(|suffix| {
        suffix.len() >= MIN_COMMIT_HEX_LEN && suffix.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

impl fmt::Display for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkipPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digest-prefix" | "prefix" => Ok(Self::DigestPrefix),
            "commit-tag" | "commit" => Ok(Self::CommitTag),
            other => Err(Error::UnknownSkipPolicy {
                name: other.to_string(),
            }),
        }
    }
}

/// Why a candidate was not deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Digest-like tag the registry cannot delete by name.
    DigestLike,
    /// Tag encoding the git commit of a build.
    CommitTag,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DigestLike => f.write_str("digest-like tag (unsupported by registry)"),
            Self::CommitTag => f.write_str("commit tag"),
        }
    }
}

/// A deletion candidate marked for deletion or skipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipDecision {
    /// The candidate, unchanged.
    pub tag: TagRecord,
    /// Reason to skip, `None` when the tag may be deleted.
    pub skip: Option<SkipReason>,
}

impl SkipDecision {
    /// Returns true if the candidate must not be deleted.
    #[must_use]
    pub const fn should_skip(&self) -> bool {
        self.skip.is_some()
    }

    /// Returns the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.tag.name()
    }
}
