//! Registry kinds the cleaner knows how to talk to.

use std::fmt;
use std::str::FromStr;

use tagsweep_core::SkipPolicy;

use crate::error::RegistryError;
use crate::reference::RepositoryReference;

/// GitHub Container Registry host.
pub const GHCR_HOST: &str = "ghcr.io";

/// DigitalOcean Container Registry host.
pub const DOCR_HOST: &str = "registry.digitalocean.com";

/// The registry a run targets.
///
/// Parsed once from the invocation and used to pick the backend, the
/// credential scheme and the default skip policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    /// GitHub Container Registry.
    Ghcr,
    /// Docker Hub.
    DockerHub,
    /// DigitalOcean Container Registry (deletes through the REST API).
    DigitalOcean,
    /// Any registry speaking the standard protocol; the name is a full reference.
    Generic,
}

impl RegistryKind {
    /// Builds the repository reference for a repository name on this registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] if the resulting reference
    /// is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_registry::RegistryKind;
    ///
    /// let r = RegistryKind::Ghcr.repository_reference("acme/app").unwrap();
    /// assert_eq!(r.to_string(), "ghcr.io/acme/app");
    ///
    /// let r = RegistryKind::DockerHub.repository_reference("nginx").unwrap();
    /// assert_eq!(r.repository(), "library/nginx");
    /// ```
    pub fn repository_reference(&self, name: &str) -> Result<RepositoryReference, RegistryError> {
        let name = self.strip_own_host(name.trim().trim_matches('/'));
        let full = match self {
            Self::Ghcr => format!("{GHCR_HOST}/{name}"),
            Self::DigitalOcean => format!("{DOCR_HOST}/{name}"),
            Self::DockerHub if !name.contains('/') => format!("library/{name}"),
            Self::DockerHub | Self::Generic => name.to_string(),
        };
        if name.is_empty() {
            return Err(RegistryError::InvalidReference {
                reference: full,
                reason: "repository name cannot be empty".to_string(),
            });
        }
        RepositoryReference::parse(&full)
    }

    /// Removes this registry's own host from the front of a repository name.
    ///
    /// `registry.digitalocean.com/acme/app` and `acme/app` name the same
    /// DigitalOcean repository. Generic names are full references and are
    /// left alone.
    fn strip_own_host<'a>(&self, name: &'a str) -> &'a str {
        let hosts: &[&str] = match self {
            Self::Ghcr => &[GHCR_HOST],
            Self::DigitalOcean => &[DOCR_HOST],
            Self::DockerHub => &["docker.io", "index.docker.io", "registry-1.docker.io"],
            Self::Generic => &[],
        };
        hosts
            .iter()
            .find_map(|host| {
                name.strip_prefix(host)
                    .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            })
            .map_or(name, |rest| rest.trim_start_matches('/'))
    }

    /// Returns the skip policy used when none is configured.
    ///
    /// DigitalOcean and unknown registries get the conservative prefix rule;
    /// GHCR and Docker Hub can delete `sha-` tags, so only commit tags are kept.
    #[must_use]
    pub const fn default_skip_policy(&self) -> SkipPolicy {
        match self {
            Self::Ghcr | Self::DockerHub => SkipPolicy::CommitTag,
            Self::DigitalOcean | Self::Generic => SkipPolicy::DigestPrefix,
        }
    }

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ghcr => "ghcr",
            Self::DockerHub => "dockerhub",
            Self::DigitalOcean => "digitalocean",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistryKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ghcr" | GHCR_HOST => Ok(Self::Ghcr),
            "dockerhub" | "docker" | "docker.io" => Ok(Self::DockerHub),
            "digitalocean" | "docr" | DOCR_HOST => Ok(Self::DigitalOcean),
            "generic" | "" => Ok(Self::Generic),
            other => Err(RegistryError::UnsupportedRegistry {
                kind: other.to_string(),
            }),
        }
    }
}
