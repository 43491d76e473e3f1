//! OCI Distribution API client.
//!
//! This module provides the raw registry operations the cleaner needs:
//! listing tags (draining pagination), reading an image's creation time
//! and deleting a tag through the standard manifest-delete endpoint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, WWW_AUTHENTICATE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{sensitive_header, Challenge, Credential, TokenResponse};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::oci::{ErrorResponse, ImageConfig, ManifestDocument, MediaType, TagList};
use crate::reference::{validate_tag, RepositoryReference};

/// Token actions requested for a manifest delete.
///
/// Token services that only know `pull` and `push` grant deletes under
/// `push`; registries that check `delete` need it named.
pub const DELETE_ACTIONS: &str = "pull,push,delete";

/// Client for the standard registry protocol.
///
/// Authorization headers obtained from token endpoints are cached per
/// scope for the lifetime of the client, which is one run.
#[derive(Debug)]
pub struct RegistryClient {
    config: RegistryConfig,
    http: reqwest::Client,
    credential: Credential,
    authorizations: Mutex<HashMap<String, HeaderValue>>,
}

impl RegistryClient {
    /// Creates a new registry client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tagsweep_registry::{Credential, RegistryClient, RegistryConfig};
    ///
    /// let client = RegistryClient::new(RegistryConfig::new(), Credential::Anonymous)?;
    /// # Ok::<(), tagsweep_registry::RegistryError>(())
    /// ```
    pub fn new(config: RegistryConfig, credential: Credential) -> Result<Self, RegistryError> {
        let http = config.build_http_client()?;

        Ok(Self {
            config,
            http,
            credential,
            authorizations: Mutex::new(HashMap::new()),
        })
    }

    /// Lists every tag of a repository.
    ///
    /// Follows `Link: <...>; rel="next"` headers until the registry stops
    /// sending them, so the result is either complete or an error.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be retrieved. A missing
    /// repository is [`RegistryError::NotFound`].
    pub async fn list_tags(
        &self,
        reference: &RepositoryReference,
    ) -> Result<Vec<String>, RegistryError> {
        let base = self.base_url(reference);
        let scope = reference.scope("pull");
        let mut next = Some(format!(
            "{base}/v2/{}/tags/list?n={}",
            reference.repository(),
            self.config.page_size
        ));
        let mut tags = Vec::new();
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let response = self.send(&scope, Method::GET, &url, None).await?;

            if response.status() == StatusCode::NOT_FOUND {
                return Err(RegistryError::NotFound {
                    repository: reference.to_string(),
                    reference: "tags/list".to_string(),
                });
            }
            if !response.status().is_success() {
                return Err(error_from(response).await);
            }

            next = next_page(&base, response.headers()).filter(|n| *n != url);
            let page: TagList = response.json().await?;
            tags.extend(page.tags.unwrap_or_default());
            pages += 1;
        }

        tracing::debug!(repository = %reference, pages, tags = tags.len(), "Listed tags");
        Ok(tags)
    }

    /// Fetches a manifest by tag or digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be fetched or parsed.
    pub async fn fetch_manifest(
        &self,
        reference: &RepositoryReference,
        manifest_ref: &str,
    ) -> Result<ManifestDocument, RegistryError> {
        let url = format!(
            "{}/v2/{}/manifests/{manifest_ref}",
            self.base_url(reference),
            reference.repository()
        );
        let accept = MediaType::manifest_accept();
        let response = self
            .send(&reference.scope("pull"), Method::GET, &url, Some(&accept))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                repository: reference.to_string(),
                reference: manifest_ref.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Reads the creation time of the image a tag points at.
    ///
    /// For an index the `linux/amd64` image is used, or the first entry when
    /// there is none. Returns `Ok(None)` if the image config has no
    /// creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag name is malformed, or the manifest or
    /// config blob cannot be fetched.
    pub async fn fetch_creation_time(
        &self,
        reference: &RepositoryReference,
        tag: &str,
    ) -> Result<Option<DateTime<Utc>>, RegistryError> {
        validate_tag(tag)?;

        let mut manifest = self.fetch_manifest(reference, tag).await?;
        if manifest.is_index() {
            let digest = manifest
                .preferred_entry()
                .map(|entry| entry.digest.clone())
                .ok_or_else(|| RegistryError::UnsupportedManifest {
                    media_type: "empty index".to_string(),
                })?;
            manifest = self.fetch_manifest(reference, &digest).await?;
        }

        let config = manifest
            .config
            .ok_or_else(|| RegistryError::UnsupportedManifest {
                media_type: manifest
                    .media_type
                    .unwrap_or_else(|| "unknown".to_string()),
            })?;

        let image: ImageConfig = self.fetch_blob_json(reference, &config.digest).await?;
        Ok(image.created)
    }

    /// Deletes a tag with the standard manifest-delete operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag name is malformed or the registry does
    /// not answer with a success status.
    pub async fn delete_tag(
        &self,
        reference: &RepositoryReference,
        tag: &str,
    ) -> Result<(), RegistryError> {
        validate_tag(tag)?;

        let url = format!(
            "{}/v2/{}/manifests/{tag}",
            self.base_url(reference),
            reference.repository()
        );
        let response = self
            .send(&reference.scope(DELETE_ACTIONS), Method::DELETE, &url, None)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                repository: reference.to_string(),
                reference: tag.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        Ok(())
    }

    /// Fetches a blob and parses it as JSON.
    async fn fetch_blob_json<T: DeserializeOwned>(
        &self,
        reference: &RepositoryReference,
        digest: &str,
    ) -> Result<T, RegistryError> {
        let url = format!(
            "{}/v2/{}/blobs/{digest}",
            self.base_url(reference),
            reference.repository()
        );
        let response = self
            .send(&reference.scope("pull"), Method::GET, &url, None)
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends a request, answering one authentication challenge if needed.
    async fn send(
        &self,
        scope: &str,
        method: Method,
        url: &str,
        accept: Option<&str>,
    ) -> Result<Response, RegistryError> {
        let request = |authorization: Option<&HeaderValue>| {
            let mut builder = self.http.request(method.clone(), url);
            if let Some(accept) = accept {
                builder = builder.header(ACCEPT, accept);
            }
            if let Some(authorization) = authorization {
                builder = builder.header(AUTHORIZATION, authorization.clone());
            }
            builder
        };

        let cached = self.cached_authorization(scope)?;
        let response = request(cached.as_ref()).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(Challenge::parse);
        let Some(challenge) = challenge else {
            return Ok(response);
        };

        let authorization = self.answer_challenge(&challenge, scope).await?;
        self.authorizations
            .lock()
            .insert(scope.to_string(), authorization.clone());

        Ok(request(Some(&authorization)).send().await?)
    }

    fn cached_authorization(&self, scope: &str) -> Result<Option<HeaderValue>, RegistryError> {
        if let Some(header) = self.authorizations.lock().get(scope) {
            return Ok(Some(header.clone()));
        }
        self.credential.preemptive_header()
    }

    async fn answer_challenge(
        &self,
        challenge: &Challenge,
        scope: &str,
    ) -> Result<HeaderValue, RegistryError> {
        match challenge {
            Challenge::Basic => {
                self.credential
                    .basic_header()?
                    .ok_or_else(|| RegistryError::AuthenticationFailed {
                        message: "registry requires basic authentication but no credentials were given"
                            .to_string(),
                    })
            }
            Challenge::Bearer { realm, service, .. } => {
                let token = self.fetch_token(realm, service.as_deref(), scope).await?;
                sensitive_header(&format!("Bearer {token}"))
            }
        }
    }

    /// Requests a bearer token for `scope` from a token endpoint.
    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: &str,
    ) -> Result<String, RegistryError> {
        let mut url = Url::parse(realm).map_err(|_| RegistryError::InvalidUrl {
            url: realm.to_string(),
        })?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", scope);
        }

        let mut request = self.http.get(url);
        if let Some(basic) = self.credential.basic_header()? {
            request = request.header(AUTHORIZATION, basic);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::AuthenticationFailed {
                message: format!("token request for {scope} rejected ({status}): {}", body.trim()),
            });
        }
        if !status.is_success() {
            return Err(error_from(response).await);
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(scope, "Obtained registry token");
        token
            .into_token()
            .ok_or_else(|| RegistryError::AuthenticationFailed {
                message: format!("token endpoint returned no token for {scope}"),
            })
    }

    fn base_url(&self, reference: &RepositoryReference) -> String {
        let host = reference.api_host();
        format!("{}://{host}", self.config.scheme_for(host))
    }
}

/// Extracts the next page URL from a `Link` header.
fn next_page(base: &str, headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    let target = link
        .split(',')
        .find(|part| part.contains("rel=\"next\"") || part.contains("rel=next"))?
        .split(';')
        .next()?
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>');

    if target.starts_with("http://") || target.starts_with("https://") {
        return Some(target.to_string());
    }
    Url::parse(base)
        .and_then(|b| b.join(target))
        .ok()
        .map(String::from)
}

/// Builds an [`RegistryError::HttpError`] from an unsuccessful response.
async fn error_from(response: Response) -> RegistryError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RegistryError::HttpError {
        status,
        message: ErrorResponse::describe(&body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_link(link: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        headers
    }

    #[test]
    fn test_client_creation() {
        let client = RegistryClient::new(RegistryConfig::new(), Credential::Anonymous);
        assert!(client.is_ok());
    }

    #[test]
    fn test_next_page_relative() {
        let headers =
            headers_with_link(r#"</v2/acme/app/tags/list?n=2&last=b>; rel="next""#);
        assert_eq!(
            next_page("https://ghcr.io", &headers).as_deref(),
            Some("https://ghcr.io/v2/acme/app/tags/list?n=2&last=b")
        );
    }

    #[test]
    fn test_next_page_absolute() {
        let headers = headers_with_link(
            r#"<https://other.example/v2/x/tags/list?last=z>; rel="next""#,
        );
        assert_eq!(
            next_page("https://ghcr.io", &headers).as_deref(),
            Some("https://other.example/v2/x/tags/list?last=z")
        );
    }

    #[test]
    fn test_next_page_absent() {
        assert!(next_page("https://ghcr.io", &HeaderMap::new()).is_none());
        let headers = headers_with_link(r#"</v2/x/tags/list>; rel="prev""#);
        assert!(next_page("https://ghcr.io", &headers).is_none());
    }

    #[test]
    fn test_base_url_for_docker_hub() {
        let client = RegistryClient::new(RegistryConfig::new(), Credential::Anonymous).unwrap();
        let reference = RepositoryReference::parse("nginx").unwrap();
        assert_eq!(client.base_url(&reference), "https://registry-1.docker.io");
    }

    #[test]
    fn test_bearer_credential_is_sent_preemptively() {
        let client = RegistryClient::new(RegistryConfig::new(), Credential::bearer("t")).unwrap();
        let header = client.cached_authorization("repository:a:pull").unwrap();
        assert_eq!(header.unwrap().to_str().unwrap(), "Bearer t");
    }
}
