//! Options for one cleanup run.

use std::time::Duration;

use tagsweep_core::RetentionPolicy;

use crate::error::{EngineError, Result};

/// Default number of concurrent metadata fetches and deletions.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Options controlling a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// How many of the newest tags to keep.
    pub retention: RetentionPolicy,

    /// Maximum in-flight registry calls while inventorying and deleting.
    pub concurrency: usize,

    /// Plan deletions without performing them.
    pub dry_run: bool,

    /// Budget for the whole run, measured from its start.
    pub deadline: Option<Duration>,
}

impl CleanupOptions {
    /// Creates options with the given retention and defaults otherwise.
    #[must_use]
    pub const fn new(retention: RetentionPolicy) -> Self {
        Self {
            retention,
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            deadline: None,
        }
    }

    /// Sets the concurrency.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the run deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOptions`] if concurrency is zero.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EngineError::InvalidOptions {
                reason: "concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CleanupOptions::new(RetentionPolicy::new(3));
        assert_eq!(options.retention.count(), 3);
        assert_eq!(options.concurrency, DEFAULT_CONCURRENCY);
        assert!(!options.dry_run);
        assert!(options.deadline.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let options = CleanupOptions::new(RetentionPolicy::new(1)).with_concurrency(0);
        assert!(matches!(
            options.validate(),
            Err(EngineError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_builders() {
        let options = CleanupOptions::new(RetentionPolicy::new(0))
            .with_concurrency(8)
            .with_dry_run(true)
            .with_deadline(Some(Duration::from_secs(60)));
        assert_eq!(options.concurrency, 8);
        assert!(options.dry_run);
        assert_eq!(options.deadline, Some(Duration::from_secs(60)));
    }
}
