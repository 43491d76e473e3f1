//! Repository references and tag names.
//!
//! A [`RepositoryReference`] names one repository on one registry host. It
//! follows the usual container reference rules:
//!
//! - `ghcr.io/acme/app` → host `ghcr.io`, repository `acme/app`
//! - `localhost:5000/app` → host `localhost:5000`, repository `app`
//! - `acme/app` → Docker Hub, repository `acme/app`
//! - `nginx` → Docker Hub, repository `library/nginx`

use std::fmt;

use crate::error::RegistryError;

/// Canonical Docker Hub registry name.
pub const DOCKER_HUB_REGISTRY: &str = "index.docker.io";

/// Host serving the Docker Hub registry API.
pub const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

const MAX_REPOSITORY_LEN: usize = 255;
const MAX_TAG_LEN: usize = 128;

/// A registry host plus repository path, validated once per run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    registry: String,
    repository: String,
}

impl RepositoryReference {
    /// Parses a repository reference.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidReference`] if the reference is empty,
    /// carries a tag or digest, or contains invalid path components.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_registry::RepositoryReference;
    ///
    /// let r = RepositoryReference::parse("ghcr.io/acme/app").unwrap();
    /// assert_eq!(r.registry(), "ghcr.io");
    /// assert_eq!(r.repository(), "acme/app");
    ///
    /// let r = RepositoryReference::parse("nginx").unwrap();
    /// assert_eq!(r.registry(), "index.docker.io");
    /// assert_eq!(r.repository(), "library/nginx");
    ///
    /// assert!(RepositoryReference::parse("ghcr.io/acme/app:latest").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, RegistryError> {
        let input = input.trim();
        let invalid = |reason: &str| RegistryError::InvalidReference {
            reference: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("reference cannot be empty"));
        }
        if input.contains('@') {
            return Err(invalid("digests are not allowed in a repository reference"));
        }

        let (registry, path) = match input.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_string(), rest.to_string())
            }
            _ => (DOCKER_HUB_REGISTRY.to_string(), input.to_string()),
        };

        if path.contains(':') {
            return Err(invalid("tags are not allowed in a repository reference"));
        }
        if !is_valid_host(&registry) {
            return Err(invalid("invalid registry host"));
        }

        let registry = if registry == "docker.io" {
            DOCKER_HUB_REGISTRY.to_string()
        } else {
            registry
        };

        let repository = if registry == DOCKER_HUB_REGISTRY && !path.contains('/') {
            format!("library/{path}")
        } else {
            path
        };

        if repository.len() > MAX_REPOSITORY_LEN {
            return Err(invalid("repository path is too long"));
        }
        if let Some(component) = repository.split('/').find(|c| !is_valid_component(c)) {
            return Err(invalid(&format!("invalid path component '{component}'")));
        }

        Ok(Self {
            registry,
            repository,
        })
    }

    /// Returns the registry name (host with optional port).
    #[must_use]
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Returns the repository path within the registry.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the host that serves the registry API.
    #[must_use]
    pub fn api_host(&self) -> &str {
        if self.registry == DOCKER_HUB_REGISTRY {
            DOCKER_HUB_API_HOST
        } else {
            &self.registry
        }
    }

    /// Returns the token scope for the given actions.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_registry::RepositoryReference;
    ///
    /// let r = RepositoryReference::parse("ghcr.io/acme/app").unwrap();
    /// assert_eq!(r.scope("pull"), "repository:acme/app:pull");
    /// ```
    #[must_use]
    pub fn scope(&self, actions: &str) -> String {
        format!("repository:{}:{actions}", self.repository)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}

/// Validates a tag name: `[A-Za-z0-9_][A-Za-z0-9._-]{0,127}`.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidTag`] if the name does not match.
///
/// # Examples
///
/// ```
/// use tagsweep_registry::validate_tag;
///
/// assert!(validate_tag("v1.2.3").is_ok());
/// assert!(validate_tag("sha-deadbee").is_ok());
/// assert!(validate_tag(".hidden").is_err());
/// assert!(validate_tag("a/b").is_err());
/// ```
pub fn validate_tag(tag: &str) -> Result<(), RegistryError> {
    let mut chars = tag.chars();
    let valid = tag.len() <= MAX_TAG_LEN
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidTag {
            tag: tag.to_string(),
        })
    }
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && !host.starts_with(['.', '-', ':'])
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}

/// A path component is lowercase alphanumeric runs joined by `.`, `_`, `__` or dashes.
fn is_valid_component(component: &str) -> bool {
    let bytes = component.as_bytes();
    let is_alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    if bytes.is_empty() || !bytes.first().is_some_and(is_alnum) || !bytes.last().is_some_and(is_alnum)
    {
        return false;
    }

    let mut i = 0;
    while i < bytes.len() {
        if is_alnum(&bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && !is_alnum(&bytes[i]) {
            i += 1;
        }
        let separator = &component[start..i];
        let ok = matches!(separator, "." | "_" | "__") || separator.bytes().all(|b| b == b'-');
        if !ok {
            return false;
        }
    }
    true
}
