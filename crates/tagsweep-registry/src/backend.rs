//! Cleanup backends.
//!
//! A backend bundles everything the engine needs to clean one repository
//! on one kind of registry: how to list tags, how to read creation times,
//! how to delete, and which tags must never be deleted. One backend is
//! selected at startup and used for the whole run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tagsweep_core::{SkipDecision, SkipPolicy, TagRecord};

use crate::auth::Credential;
use crate::client::RegistryClient;
use crate::config::RegistryConfig;
use crate::digitalocean::DigitalOceanApi;
use crate::error::RegistryError;
use crate::kind::RegistryKind;
use crate::reference::RepositoryReference;

/// Capabilities of a registry backend.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Repository this backend operates on.
    fn repository(&self) -> &RepositoryReference;

    /// Rule deciding which candidates are never deleted.
    fn skip_policy(&self) -> SkipPolicy;

    /// Lists every tag of the repository.
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError>;

    /// Reads the creation time of the image behind a tag.
    async fn fetch_created_at(&self, tag: &str) -> Result<Option<DateTime<Utc>>, RegistryError>;

    /// Deletes one tag.
    async fn delete_tag(&self, tag: &str) -> Result<(), RegistryError>;

    /// Decides whether a candidate must be skipped.
    fn should_skip(&self, record: &TagRecord) -> SkipDecision {
        self.skip_policy().evaluate(record)
    }
}

/// Backend for registries that delete tags through the standard protocol.
#[derive(Debug)]
pub struct OciBackend {
    client: RegistryClient,
    reference: RepositoryReference,
    skip_policy: SkipPolicy,
}

impl OciBackend {
    /// Creates a backend for `reference`.
    #[must_use]
    pub const fn new(
        client: RegistryClient,
        reference: RepositoryReference,
        skip_policy: SkipPolicy,
    ) -> Self {
        Self {
            client,
            reference,
            skip_policy,
        }
    }
}

#[async_trait]
impl RegistryBackend for OciBackend {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn repository(&self) -> &RepositoryReference {
        &self.reference
    }

    fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        self.client.list_tags(&self.reference).await
    }

    async fn fetch_created_at(&self, tag: &str) -> Result<Option<DateTime<Utc>>, RegistryError> {
        self.client.fetch_creation_time(&self.reference, tag).await
    }

    async fn delete_tag(&self, tag: &str) -> Result<(), RegistryError> {
        self.client.delete_tag(&self.reference, tag).await
    }
}

/// Backend for DigitalOcean: registry protocol for reads, REST API for deletes.
#[derive(Debug)]
pub struct DigitalOceanBackend {
    client: RegistryClient,
    api: DigitalOceanApi,
    reference: RepositoryReference,
    skip_policy: SkipPolicy,
}

impl DigitalOceanBackend {
    /// Creates a backend for `reference`.
    #[must_use]
    pub const fn new(
        client: RegistryClient,
        api: DigitalOceanApi,
        reference: RepositoryReference,
        skip_policy: SkipPolicy,
    ) -> Self {
        Self {
            client,
            api,
            reference,
            skip_policy,
        }
    }
}

#[async_trait]
impl RegistryBackend for DigitalOceanBackend {
    fn name(&self) -> &'static str {
        "digitalocean"
    }

    fn repository(&self) -> &RepositoryReference {
        &self.reference
    }

    fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        self.client.list_tags(&self.reference).await
    }

    async fn fetch_created_at(&self, tag: &str) -> Result<Option<DateTime<Utc>>, RegistryError> {
        self.client.fetch_creation_time(&self.reference, tag).await
    }

    async fn delete_tag(&self, tag: &str) -> Result<(), RegistryError> {
        self.api.delete_tag(self.reference.repository(), tag).await
    }
}

/// Inputs needed to select a backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Registry kind.
    pub kind: RegistryKind,
    /// Repository name as given by the user.
    pub name: String,
    /// Optional username.
    pub username: Option<String>,
    /// Optional password or token.
    pub password: Option<String>,
    /// Skip policy override; the kind's default when `None`.
    pub skip_policy: Option<SkipPolicy>,
    /// Client configuration.
    pub config: RegistryConfig,
    /// DigitalOcean API endpoint override.
    pub digitalocean_api_url: Option<String>,
}

impl BackendSettings {
    /// Creates settings with no credentials and default configuration.
    #[must_use]
    pub fn new(kind: RegistryKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            username: None,
            password: None,
            skip_policy: None,
            config: RegistryConfig::new(),
            digitalocean_api_url: None,
        }
    }

    /// Sets the username and password.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Overrides the skip policy.
    #[must_use]
    pub const fn with_skip_policy(mut self, policy: Option<SkipPolicy>) -> Self {
        self.skip_policy = policy;
        self
    }

    /// Sets the client configuration.
    #[must_use]
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the DigitalOcean API endpoint.
    #[must_use]
    pub fn with_digitalocean_api_url(mut self, url: impl Into<String>) -> Self {
        self.digitalocean_api_url = Some(url.into());
        self
    }
}

/// Selects and builds the backend for a run.
///
/// All configuration errors surface here, before any network call.
///
/// # Errors
///
/// Returns an error if the repository reference is invalid, required
/// credentials are missing, or a client cannot be built.
///
/// # Examples
///
/// ```
/// use tagsweep_core::SkipPolicy;
/// use tagsweep_registry::{select_backend, BackendSettings, RegistryKind};
///
/// let backend = select_backend(&BackendSettings::new(RegistryKind::Ghcr, "acme/app")).unwrap();
/// assert_eq!(backend.repository().to_string(), "ghcr.io/acme/app");
/// assert_eq!(backend.skip_policy(), SkipPolicy::CommitTag);
///
/// let missing_token = BackendSettings::new(RegistryKind::DigitalOcean, "acme/app");
/// assert!(select_backend(&missing_token).is_err());
/// ```
pub fn select_backend(
    settings: &BackendSettings,
) -> Result<Box<dyn RegistryBackend>, RegistryError> {
    let kind = settings.kind;
    let reference = kind.repository_reference(&settings.name)?;
    let credential = Credential::resolve(
        kind,
        settings.username.as_deref(),
        settings.password.as_deref(),
    )?;
    let skip_policy = settings
        .skip_policy
        .unwrap_or_else(|| kind.default_skip_policy());

    tracing::debug!(
        registry = %kind,
        repository = %reference,
        skip_policy = %skip_policy,
        credential = ?credential,
        "Selected backend"
    );

    match kind {
        RegistryKind::DigitalOcean => {
            let token = credential
                .secret()
                .map(ToString::to_string)
                .ok_or_else(|| RegistryError::AuthConfig {
                    message: "missing DigitalOcean API token".to_string(),
                })?;
            let api = match settings.digitalocean_api_url.as_deref() {
                Some(url) => DigitalOceanApi::with_base_url(&settings.config, url, token)?,
                None => DigitalOceanApi::new(&settings.config, token)?,
            };
            let client = RegistryClient::new(settings.config.clone(), credential)?;
            Ok(Box::new(DigitalOceanBackend::new(
                client,
                api,
                reference,
                skip_policy,
            )))
        }
        RegistryKind::Ghcr | RegistryKind::DockerHub | RegistryKind::Generic => {
            let client = RegistryClient::new(settings.config.clone(), credential)?;
            Ok(Box::new(OciBackend::new(client, reference, skip_policy)))
        }
    }
}
