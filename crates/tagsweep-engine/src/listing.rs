//! Read-only listing of a repository's tags.

use std::fmt::Write as _;

use serde::Serialize;
use tagsweep_core::{report::render_tag_table, Inventory, TagFailure};

use crate::error::Result;

/// Tags of a repository with their creation times, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Repository that was listed.
    pub repository: String,
    /// Inventoried tags, newest first.
    pub inventory: Inventory,
    /// Tags whose metadata could not be read.
    pub failures: Vec<TagFailure>,
}

impl Listing {
    /// Renders the tag table followed by any unreadable tags.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = render_tag_table(&self.inventory);
        if !self.failures.is_empty() {
            out.push('\n');
            for failure in &self.failures {
                let _ = writeln!(out, "unreadable {failure}");
            }
        }
        out
    }

    /// Renders the listing as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagsweep_core::TagRecord;

    fn listing() -> Listing {
        Listing {
            repository: "ghcr.io/acme/app".to_string(),
            inventory: Inventory::from(vec![TagRecord::new("v1", None)]),
            failures: vec![TagFailure::new("broken", "manifest unknown")],
        }
    }

    #[test]
    fn test_render_text() {
        let text = listing().render_text();
        assert!(text.starts_with("Tag"));
        assert!(text.contains("v1"));
        assert!(text.contains("unreadable broken: manifest unknown"));
    }

    #[test]
    fn test_to_json() {
        let json: serde_json::Value = serde_json::from_str(&listing().to_json().unwrap()).unwrap();
        assert_eq!(json["repository"], "ghcr.io/acme/app");
        assert_eq!(json["inventory"][0]["name"], "v1");
        assert_eq!(json["failures"][0]["tag"], "broken");
    }
}
