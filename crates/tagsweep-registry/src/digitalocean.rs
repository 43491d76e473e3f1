//! DigitalOcean Container Registry REST API.
//!
//! DOCR does not accept manifest deletes on the registry protocol; tags are
//! removed through the DigitalOcean API instead.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

use crate::auth::Credential;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::reference::validate_tag;

/// Public DigitalOcean API endpoint.
pub const DIGITALOCEAN_API_URL: &str = "https://api.digitalocean.com";

/// Client for the registry part of the DigitalOcean API.
pub struct DigitalOceanApi {
    http: reqwest::Client,
    base_url: Url,
    authorization: HeaderValue,
}

impl std::fmt::Debug for DigitalOceanApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DigitalOceanApi {
    /// Creates a client against the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &RegistryConfig, token: impl Into<String>) -> Result<Self, RegistryError> {
        Self::with_base_url(config, DIGITALOCEAN_API_URL, token)
    }

    /// Creates a client against a custom API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the token is empty or not a
    /// valid header value, or the HTTP client cannot be created.
    pub fn with_base_url(
        config: &RegistryConfig,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| RegistryError::InvalidUrl {
                url: base_url.to_string(),
            })?;

        let token = token.into();
        if token.trim().is_empty() {
            return Err(RegistryError::AuthConfig {
                message: "missing DigitalOcean API token".to_string(),
            });
        }
        let authorization = Credential::bearer(token)
            .preemptive_header()?
            .ok_or_else(|| RegistryError::AuthConfig {
                message: "DigitalOcean API requires a bearer token".to_string(),
            })?;

        Ok(Self {
            http: config.build_http_client()?,
            base_url,
            authorization,
        })
    }

    /// Builds the endpoint for one tag of `registry/repository`.
    ///
    /// The first path component is the registry name; the rest is the
    /// repository name, sent as a single percent-encoded segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository path has no repository part or
    /// the tag is malformed.
    pub fn tag_url(&self, repository_path: &str, tag: &str) -> Result<Url, RegistryError> {
        validate_tag(tag)?;

        let (registry, repository) = repository_path
            .split_once('/')
            .filter(|(r, repo)| !r.is_empty() && !repo.is_empty())
            .ok_or_else(|| RegistryError::InvalidReference {
                reference: repository_path.to_string(),
                reason: "expected <registry>/<repository>".to_string(),
            })?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::InvalidUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(["v2", "registry", registry, "repositories", repository, "tags", tag]);
        Ok(url)
    }

    /// Deletes a tag.
    ///
    /// Only `204 No Content` counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::HttpError`] with the status and response
    /// body for any other answer.
    pub async fn delete_tag(&self, repository_path: &str, tag: &str) -> Result<(), RegistryError> {
        let url = self.tag_url(repository_path, tag)?;

        let response = self
            .http
            .delete(url)
            .header(AUTHORIZATION, self.authorization.clone())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::HttpError {
            status: status.as_u16(),
            message: format!("unexpected status, body: {}", body.trim()),
        })
    }
}
