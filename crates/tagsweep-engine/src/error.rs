//! Error types for the engine crate.
//!
//! Only failures that abort a whole run live here. Per-tag problems are
//! recorded in the report instead.

use tagsweep_registry::RegistryError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that abort a cleanup run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The tag list could not be retrieved.
    #[error("failed to list tags of '{repository}': {source}")]
    ListFailed {
        /// Repository being cleaned.
        repository: String,
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },

    /// The run deadline passed before the tag list arrived.
    #[error("run deadline exceeded while listing tags of '{repository}'")]
    ListTimedOut {
        /// Repository being cleaned.
        repository: String,
    },

    /// Run options are invalid.
    #[error("invalid options: {reason}")]
    InvalidOptions {
        /// Reason for invalidity.
        reason: String,
    },

    /// The report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_failed_display() {
        let err = EngineError::ListFailed {
            repository: "ghcr.io/acme/app".to_string(),
            source: RegistryError::NotFound {
                repository: "ghcr.io/acme/app".to_string(),
                reference: "tags/list".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "failed to list tags of 'ghcr.io/acme/app': Not found: ghcr.io/acme/app:tags/list"
        );
    }

    #[test]
    fn test_list_timed_out_display() {
        let err = EngineError::ListTimedOut {
            repository: "ghcr.io/acme/app".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "run deadline exceeded while listing tags of 'ghcr.io/acme/app'"
        );
    }

    #[test]
    fn test_invalid_options_display() {
        let err = EngineError::InvalidOptions {
            reason: "concurrency must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid options: concurrency must be at least 1"
        );
    }
}
