//! Error types for tagsweep core operations.
//!
//! This module defines the error types used throughout the `tagsweep-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tagsweep core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required input was not provided.
    #[error("missing '{name}'")]
    MissingInput {
        /// Name of the missing input.
        name: String,
    },

    /// The retention count is not a non-negative integer.
    #[error("invalid retention count '{value}': {reason}")]
    InvalidRetentionCount {
        /// Raw value that was supplied.
        value: String,
        /// Reason the value was rejected.
        reason: String,
    },

    /// Unknown skip policy name.
    #[error("unknown skip policy '{name}' (expected 'digest-prefix' or 'commit-tag')")]
    UnknownSkipPolicy {
        /// Name that was supplied.
        name: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_input() {
        let err = Error::MissingInput {
            name: "max-images".to_string(),
        };
        assert_eq!(err.to_string(), "missing 'max-images'");
    }

    #[test]
    fn test_error_display_invalid_retention() {
        let err = Error::InvalidRetentionCount {
            value: "-1".to_string(),
            reason: "must not be negative".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid retention count '-1': must not be negative"
        );
    }

    #[test]
    fn test_error_display_unknown_skip_policy() {
        let err = Error::UnknownSkipPolicy {
            name: "never".to_string(),
        };
        assert!(err.to_string().contains("'never'"));
    }
}
