//! Client settings shared by every backend.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of tags requested per page when listing.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Configuration shared by the registry protocol and REST clients.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Per-request timeout.
    pub timeout: Duration,

    /// TLS configuration for self-hosted registries.
    pub tls: Option<TlsConfig>,

    /// Sent as `User-Agent` on every request.
    pub user_agent: String,

    /// Page size requested from `/tags/list`.
    pub page_size: usize,

    /// Talk plain HTTP to every registry host.
    ///
    /// `localhost` and loopback addresses always use plain HTTP.
    pub plain_http: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryConfig {
    /// 30 second timeout, page size 100, HTTPS except for loopback hosts.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use tagsweep_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new();
    /// assert_eq!(config.timeout, Duration::from_secs(30));
    /// assert_eq!(config.page_size, 100);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            tls: None,
            user_agent: format!("tagsweep/{}", env!("CARGO_PKG_VERSION")),
            page_size: DEFAULT_PAGE_SIZE,
            plain_http: false,
        }
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attaches trust settings.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Sets the listing page size (at least 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Forces plain HTTP for all hosts.
    #[must_use]
    pub const fn with_plain_http(mut self, plain_http: bool) -> Self {
        self.plain_http = plain_http;
        self
    }

    /// Returns the URL scheme to use for a registry host.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsweep_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new();
    /// assert_eq!(config.scheme_for("ghcr.io"), "https");
    /// assert_eq!(config.scheme_for("localhost:5000"), "http");
    /// assert_eq!(config.scheme_for("127.0.0.1:5000"), "http");
    /// ```
    #[must_use]
    pub fn scheme_for(&self, host: &str) -> &'static str {
        let hostname = host.rsplit_once(':').map_or(host, |(h, _)| h);
        if self.plain_http || matches!(hostname, "localhost" | "127.0.0.1" | "[::1]") {
            "http"
        } else {
            "https"
        }
    }

    /// Builds an HTTP client honouring this configuration.
    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, crate::RegistryError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent);

        if let Some(ref tls) = self.tls {
            if tls.insecure_skip_verify {
                builder = builder.danger_accept_invalid_certs(true);
            }

            if let Some(ref ca_cert) = tls.ca_cert {
                let cert_pem =
                    std::fs::read(ca_cert).map_err(|e| crate::RegistryError::IoError {
                        path: ca_cert.clone(),
                        source: e,
                    })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                    crate::RegistryError::InvalidCertificate {
                        message: format!("Invalid CA certificate: {e}"),
                    }
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder.build().map_err(|e| crate::RegistryError::HttpError {
            status: 0,
            message: format!("Failed to build HTTP client: {e}"),
        })
    }
}

/// Trust settings for self-hosted registries.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Extra PEM root certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept any server certificate.
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// System roots only, verification on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ca_cert: None,
            insecure_skip_verify: false,
        }
    }

    /// Trusts the PEM bundle at `path` in addition to the system roots.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Disables certificate verification. Local test registries only.
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.insecure_skip_verify = true;
        self
    }
}
