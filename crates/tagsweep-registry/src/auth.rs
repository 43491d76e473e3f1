//! Credentials and registry authentication challenges.

use std::collections::HashMap;
use std::fmt;

use base64::Engine as _;
use reqwest::header::HeaderValue;
use serde::Deserialize;

use crate::error::RegistryError;
use crate::kind::RegistryKind;

/// Username DigitalOcean expects alongside an API token on the registry protocol.
pub const DOCR_USERNAME: &str = "doctoken";

/// Authentication payload for one run.
///
/// The `Debug` implementation never prints secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// No authentication.
    Anonymous,

    /// Username and password (or username and token).
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },

    /// Bearer token sent as-is.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl Credential {
    /// Creates basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates bearer token authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Resolves the credential for a registry kind from optional inputs.
    ///
    /// Empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AuthConfig`] when DigitalOcean is selected
    /// without a token, or when only one of username and password is given.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_registry::{Credential, RegistryKind};
    ///
    /// let c = Credential::resolve(RegistryKind::DigitalOcean, None, Some("dop_v1_x")).unwrap();
    /// assert_eq!(c, Credential::basic("doctoken", "dop_v1_x"));
    ///
    /// assert!(Credential::resolve(RegistryKind::DigitalOcean, None, None).is_err());
    /// assert_eq!(
    ///     Credential::resolve(RegistryKind::Ghcr, None, None).unwrap(),
    ///     Credential::Anonymous
    /// );
    /// ```
    pub fn resolve(
        kind: RegistryKind,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let username = username.filter(|s| !s.is_empty());
        let password = password.filter(|s| !s.is_empty());

        if kind == RegistryKind::DigitalOcean {
            let token = password.ok_or_else(|| RegistryError::AuthConfig {
                message: "missing DigitalOcean API token (pass it as the password)".to_string(),
            })?;
            return Ok(Self::basic(DOCR_USERNAME, token));
        }

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self::basic(username, password)),
            (None, None) => Ok(Self::Anonymous),
            _ => Err(RegistryError::AuthConfig {
                message: "both username and password are required for basic authentication"
                    .to_string(),
            }),
        }
    }

    /// Returns the secret part (password or token), if any.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Basic { password, .. } => Some(password),
            Self::Bearer { token } => Some(token),
        }
    }

    /// Returns the `Authorization` header for a `Basic` credential.
    pub(crate) fn basic_header(&self) -> Result<Option<HeaderValue>, RegistryError> {
        match self {
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                sensitive_header(&format!("Basic {encoded}")).map(Some)
            }
            Self::Anonymous | Self::Bearer { .. } => Ok(None),
        }
    }

    /// Returns the `Authorization` header sent before any challenge.
    pub(crate) fn preemptive_header(&self) -> Result<Option<HeaderValue>, RegistryError> {
        match self {
            Self::Bearer { token } => sensitive_header(&format!("Bearer {token}")).map(Some),
            Self::Anonymous | Self::Basic { .. } => Ok(None),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

pub(crate) fn sensitive_header(value: &str) -> Result<HeaderValue, RegistryError> {
    let mut header = HeaderValue::from_str(value).map_err(|_| RegistryError::AuthConfig {
        message: "credentials contain characters not allowed in HTTP headers".to_string(),
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// A parsed `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Challenge {
    /// Answer with the basic credential.
    Basic,
    /// Fetch a token from `realm`.
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

impl Challenge {
    /// Parses a challenge header such as
    /// `Bearer realm="https://ghcr.io/token",service="ghcr.io",scope="repository:a/b:pull"`.
    pub(crate) fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(char::is_whitespace).unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(Self::Basic);
        }
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut params = parse_params(rest);
        let realm = params.remove("realm")?;
        Some(Self::Bearer {
            realm,
            service: params.remove("service"),
            scope: params.remove("scope"),
        })
    }
}

/// Splits `key="value",key2=value2` honouring commas inside quotes.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut in_quotes = false;

    let mut flush = |key: &mut String, value: &mut String| {
        let k = key.trim().to_ascii_lowercase();
        if !k.is_empty() {
            params.insert(k, value.trim().to_string());
        }
        key.clear();
        value.clear();
    };

    for c in input.chars() {
        match c {
            '"' if in_value => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                flush(&mut key, &mut value);
                in_value = false;
            }
            '=' if !in_value => in_value = true,
            _ if in_value => value.push(c),
            _ => key.push(c),
        }
    }
    flush(&mut key, &mut value);
    params
}

/// Response of a token endpoint. Registries use either field name.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or(self.access_token)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_basic() {
        let c = Credential::resolve(RegistryKind::Ghcr, Some("me"), Some("pat")).unwrap();
        assert_eq!(c, Credential::basic("me", "pat"));
    }

    #[test]
    fn test_resolve_half_basic_fails() {
        let err = Credential::resolve(RegistryKind::DockerHub, Some("me"), None).unwrap_err();
        assert!(matches!(err, RegistryError::AuthConfig { .. }));
        assert!(Credential::resolve(RegistryKind::Generic, Some(""), Some("pw")).is_err());
    }

    #[test]
    fn test_resolve_empty_strings_are_absent() {
        let c = Credential::resolve(RegistryKind::Generic, Some(""), Some("")).unwrap();
        assert_eq!(c, Credential::Anonymous);
    }

    #[test]
    fn test_docr_ignores_username() {
        let c = Credential::resolve(RegistryKind::DigitalOcean, Some("someone"), Some("tok"))
            .unwrap();
        assert_eq!(c, Credential::basic(DOCR_USERNAME, "tok"));
        assert_eq!(c.secret(), Some("tok"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let basic = format!("{:?}", Credential::basic("me", "hunter2"));
        assert!(basic.contains("me"));
        assert!(!basic.contains("hunter2"));

        let bearer = format!("{:?}", Credential::bearer("s3cr3t"));
        assert!(!bearer.contains("s3cr3t"));
    }

    #[test]
    fn test_basic_header() {
        let header = Credential::basic("user", "pass").basic_header().unwrap().unwrap();
        assert_eq!(header.to_str().unwrap(), "Basic dXNlcjpwYXNz");
        assert!(header.is_sensitive());
        assert!(Credential::Anonymous.basic_header().unwrap().is_none());
    }

    #[test]
    fn test_preemptive_header() {
        let header = Credential::bearer("abc").preemptive_header().unwrap().unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer abc");
        assert!(Credential::basic("a", "b").preemptive_header().unwrap().is_none());
    }

    #[test]
    fn test_parse_bearer_challenge() {
        let challenge = Challenge::parse(
            r#"Bearer realm="https://ghcr.io/token",service="ghcr.io",scope="repository:acme/app:pull,push""#,
        )
        .unwrap();
        assert_eq!(
            challenge,
            Challenge::Bearer {
                realm: "https://ghcr.io/token".to_string(),
                service: Some("ghcr.io".to_string()),
                scope: Some("repository:acme/app:pull,push".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_basic_challenge() {
        assert_eq!(
            Challenge::parse(r#"Basic realm="Registry Realm""#),
            Some(Challenge::Basic)
        );
    }

    #[test]
    fn test_parse_unknown_or_incomplete_challenge() {
        assert_eq!(Challenge::parse("Negotiate"), None);
        assert_eq!(Challenge::parse(r#"Bearer service="x""#), None);
    }

    #[test]
    fn test_token_response_fields() {
        let r: TokenResponse = serde_json::from_str(r#"{"token":"a"}"#).unwrap();
        assert_eq!(r.into_token().as_deref(), Some("a"));
        let r: TokenResponse = serde_json::from_str(r#"{"access_token":"b"}"#).unwrap();
        assert_eq!(r.into_token().as_deref(), Some("b"));
        let r: TokenResponse = serde_json::from_str(r#"{"token":"","access_token":"c"}"#).unwrap();
        assert_eq!(r.into_token().as_deref(), Some("c"));
        let r: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(r.into_token().is_none());
    }
}
