//! Run report and its text rendering.

use std::fmt::Write as _;

use serde::Serialize;

use crate::outcome::{DeletionOutcome, TagFailure};
use crate::safety::SkipPolicy;
use crate::tag::{Inventory, TagRecord};

/// Format used for creation times in the tag table.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const TABLE_RULE: &str = "---------------------------------------------------------------";

/// Everything a cleanup run produced.
///
/// The report is never discarded on individual failures: every candidate
/// has exactly one outcome and every tag that could not be inventoried has
/// one failure entry.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Repository the run operated on.
    pub repository: String,
    /// Retention count used.
    pub retention: usize,
    /// Skip policy applied to candidates.
    pub skip_policy: SkipPolicy,
    /// Whether deletions were only planned.
    pub dry_run: bool,
    /// Inventoried tags, newest first.
    pub inventory: Inventory,
    /// Names of tags kept by the retention policy.
    pub kept: Vec<String>,
    /// Tags excluded from the inventory.
    pub failures: Vec<TagFailure>,
    /// One outcome per deletion candidate.
    pub outcomes: Vec<DeletionOutcome>,
}

/// Counters summarizing a [`CleanupReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Inventoried tags.
    pub tags: usize,
    /// Kept tags.
    pub kept: usize,
    /// Deleted tags.
    pub deleted: usize,
    /// Skipped candidates.
    pub skipped: usize,
    /// Failed deletions.
    pub failed: usize,
    /// Tags that could not be inventoried.
    pub unreadable: usize,
}

impl CleanupReport {
    /// Computes the summary counters.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            tags: self.inventory.len(),
            kept: self.kept.len(),
            deleted: self.outcomes.iter().filter(|o| o.is_deleted()).count(),
            skipped: self.outcomes.iter().filter(|o| o.is_skipped()).count(),
            failed: self.outcomes.iter().filter(|o| o.is_failed()).count(),
            unreadable: self.failures.len(),
        }
    }

    /// Returns true if any tag failed to inventory or delete.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || self.outcomes.iter().any(DeletionOutcome::is_failed)
    }

    /// Renders the report as plain text: tag table, outcome lines, summary.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = render_tag_table(&self.inventory);

        if !self.failures.is_empty() {
            out.push('\n');
            for failure in &self.failures {
                let _ = writeln!(out, "unreadable {failure}");
            }
        }

        if !self.outcomes.is_empty() {
            out.push('\n');
            for outcome in &self.outcomes {
                let _ = writeln!(out, "{outcome}");
            }
        }

        let s = self.summary();
        let _ = writeln!(
            out,
            "\n{}: {} tags, {} kept, {} deleted, {} skipped, {} failed, {} unreadable{}",
            self.repository,
            s.tags,
            s.kept,
            s.deleted,
            s.skipped,
            s.failed,
            s.unreadable,
            if self.dry_run { " (dry run)" } else { "" }
        );
        out
    }

    /// Renders the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Renders the tag table in the inventory's current order.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use tagsweep_core::{report::render_tag_table, Inventory, TagRecord};
///
/// let inventory = Inventory::from(vec![
///     TagRecord::new("v1", DateTime::from_timestamp(0, 0)),
///     TagRecord::new("mystery", None),
/// ]);
/// let table = render_tag_table(&inventory);
/// assert!(table.contains("1970-01-01 00:00:00 UTC"));
/// ```
#[must_use]
pub fn render_tag_table(inventory: &Inventory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<30} {:<25}", "Tag", "Created At");
    let _ = writeln!(out, "{TABLE_RULE}");
    for record in inventory {
        let _ = writeln!(out, "{:<30} {:<25}", record.name(), created_at_cell(record));
    }
    out
}

fn created_at_cell(record: &TagRecord) -> String {
    record
        .created_at()
        .map(|t| t.format(CREATED_AT_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn report() -> CleanupReport {
        CleanupReport {
            repository: "ghcr.io/acme/app".to_string(),
            retention: 1,
            skip_policy: SkipPolicy::CommitTag,
            dry_run: false,
            inventory: Inventory::from(vec![
                TagRecord::new("v3", DateTime::from_timestamp(300, 0)),
                TagRecord::new("v2", DateTime::from_timestamp(200, 0)),
                TagRecord::new("v1", None),
            ]),
            kept: vec!["v3".to_string()],
            failures: vec![TagFailure::new("broken", "manifest unknown")],
            outcomes: vec![
                DeletionOutcome::deleted("v2"),
                DeletionOutcome::failed("v1", "HTTP 500"),
            ],
        }
    }

    #[test]
    fn test_summary_counts() {
        let s = report().summary();
        assert_eq!(s.tags, 3);
        assert_eq!(s.kept, 1);
        assert_eq!(s.deleted, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.skipped, 0);
        assert_eq!(s.unreadable, 1);
        assert!(report().has_failures());
    }

    #[test]
    fn test_table_rows() {
        let table = render_tag_table(&report().inventory);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Tag"));
        assert!(lines[0].contains("Created At"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].starts_with("v3"));
        assert!(lines[2].contains("1970-01-01 00:05:00 UTC"));
        assert_eq!(lines[4].trim_end(), "v1");
    }

    #[test]
    fn test_render_text_lists_outcomes() {
        let text = report().render_text();
        assert!(text.contains("deleted v2"));
        assert!(text.contains("failed v1: HTTP 500"));
        assert!(text.contains("unreadable broken: manifest unknown"));
        assert!(text.contains("3 tags, 1 kept, 1 deleted, 0 skipped, 1 failed, 1 unreadable"));
    }

    #[test]
    fn test_json_report() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["repository"], "ghcr.io/acme/app");
        assert_eq!(json["skip_policy"], "commit-tag");
        assert_eq!(json["inventory"][0]["name"], "v3");
        assert_eq!(json["outcomes"].as_array().unwrap().len(), 2);
    }
}
