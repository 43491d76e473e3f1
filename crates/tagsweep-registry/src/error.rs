//! Errors raised while talking to a registry.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single registry call or of backend setup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry host could not be reached.
    #[error("Cannot reach {url}: {source}")]
    ConnectionFailed {
        /// URL of the failed request.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Required secrets are missing for the selected backend.
    #[error("Invalid credentials configuration: {message}")]
    AuthConfig {
        /// Error message.
        message: String,
    },

    /// The registry or its token service refused the credentials.
    #[error("Registry rejected credentials: {message}")]
    AuthenticationFailed {
        /// Error message.
        message: String,
    },

    /// Repository, tag or blob does not exist.
    #[error("Not found: {repository}:{reference}")]
    NotFound {
        /// Repository.
        repository: String,
        /// Tag, digest or path that was requested.
        reference: String,
    },

    /// Non-success status, or a transport failure reported as status 0.
    #[error("Registry returned {status}: {message}")]
    HttpError {
        /// HTTP status code, 0 when the request never got an answer.
        status: u16,
        /// Registry error body or transport message.
        message: String,
    },

    /// Response body was not the JSON we expected.
    #[error("Malformed registry response: {source}")]
    JsonError {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A registry or API URL could not be parsed.
    #[error("Malformed URL: {url}")]
    InvalidUrl {
        /// Offending value.
        url: String,
    },

    /// Invalid repository reference.
    #[error("Invalid repository reference '{reference}': {reason}")]
    InvalidReference {
        /// Value as supplied.
        reference: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Tag name that cannot be addressed through the registry API.
    #[error("Invalid tag name: {tag}")]
    InvalidTag {
        /// Tag string.
        tag: String,
    },

    /// Registry kind identifier not recognised.
    #[error("Unsupported registry: {kind}")]
    UnsupportedRegistry {
        /// Identifier that was supplied.
        kind: String,
    },

    /// Manifest shape this client cannot read a creation time from.
    #[error("Unsupported manifest media type: {media_type}")]
    UnsupportedManifest {
        /// Media type reported by the registry.
        media_type: String,
    },

    /// A CA bundle could not be read.
    #[error("Cannot read {path}: {source}")]
    IoError {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TLS material could not be loaded.
    #[error("Invalid certificate: {message}")]
    InvalidCertificate {
        /// Error message.
        message: String,
    },
}

impl RegistryError {
    /// Returns true for errors caused by the run's configuration rather than the registry.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AuthConfig { .. }
                | Self::InvalidReference { .. }
                | Self::UnsupportedRegistry { .. }
                | Self::InvalidUrl { .. }
                | Self::IoError { .. }
                | Self::InvalidCertificate { .. }
        )
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            let url = err.url().map_or_else(String::new, ToString::to_string);
            return Self::ConnectionFailed { url, source: err };
        }
        Self::HttpError {
            status: err.status().map_or(0, |code| code.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = RegistryError::NotFound {
            repository: "acme/app".to_string(),
            reference: "v1.2.0".to_string(),
        };
        assert_eq!(err.to_string(), "Not found: acme/app:v1.2.0");
    }

    #[test]
    fn test_error_display_auth_config() {
        let err = RegistryError::AuthConfig {
            message: "missing DigitalOcean API token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid credentials configuration: missing DigitalOcean API token"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_error_display_http() {
        let err = RegistryError::HttpError {
            status: 405,
            message: "UNSUPPORTED: The operation is unsupported.".to_string(),
        };
        assert!(err.to_string().contains("405"));
        assert!(!err.is_configuration());
    }
}
