//! CLI commands and argument parsing.
//!
//! Every option can come from a flag, a `TAGSWEEP_*` environment variable
//! or, for the inputs a GitHub Action declares, an `INPUT_*` variable.
//! Flags win over `TAGSWEEP_*`, which win over `INPUT_*`. Empty values
//! count as absent.

pub mod clean;
pub mod list;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tagsweep_registry::{BackendSettings, RegistryConfig, RegistryKind, TlsConfig};

/// tagsweep - keep the newest image tags, delete the rest
#[derive(Parser)]
#[command(name = "tagsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default `clean` action
    #[command(flatten)]
    pub clean: clean::CleanArgs,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Delete all but the newest tags (default)
    Clean(clean::CleanArgs),

    /// Print the repository's tags, newest first
    List(list::ListArgs),

    /// Print version information
    Version,
}

/// Output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Registry selection and connection options shared by all commands.
#[derive(Args, Debug, Default)]
pub struct RegistryArgs {
    /// Registry: ghcr, dockerhub, digitalocean or generic
    #[arg(long, env = "TAGSWEEP_REGISTRY")]
    pub registry: Option<String>,

    /// Repository name (a full reference for generic registries)
    #[arg(long, env = "TAGSWEEP_NAME")]
    pub name: Option<String>,

    /// Registry username
    #[arg(long, env = "TAGSWEEP_USERNAME")]
    pub username: Option<String>,

    /// Registry password or API token
    #[arg(long, env = "TAGSWEEP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Parallel metadata fetches and deletions
    #[arg(long, env = "TAGSWEEP_CONCURRENCY", default_value_t = tagsweep_engine::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "TAGSWEEP_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// CA certificate for self-hosted registries
    #[arg(long, env = "TAGSWEEP_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long, env = "TAGSWEEP_INSECURE")]
    pub insecure: bool,

    /// Use plain HTTP for every registry host
    #[arg(long, env = "TAGSWEEP_PLAIN_HTTP")]
    pub plain_http: bool,

    /// DigitalOcean API endpoint
    #[arg(long, env = "TAGSWEEP_DIGITALOCEAN_API_URL", hide = true)]
    pub digitalocean_api_url: Option<String>,

    /// Output format
    #[arg(long, env = "TAGSWEEP_FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RegistryArgs {
    /// Resolves backend settings from flags, environment and action inputs.
    ///
    /// The skip policy is left unset; commands that delete add it.
    pub fn backend_settings(&self, inputs: &ActionInputs) -> Result<BackendSettings> {
        let kind = pick(self.registry.as_deref(), inputs.get("REGISTRY"))
            .map_or(Ok(RegistryKind::Generic), |s| s.parse::<RegistryKind>())
            .context("Invalid registry")?;

        let Some(name) = pick(self.name.as_deref(), inputs.get("NAME")) else {
            bail!("Missing repository name (--name, TAGSWEEP_NAME or INPUT_NAME)");
        };

        if self.concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }

        let mut config = RegistryConfig::new()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_plain_http(self.plain_http);
        if self.ca_cert.is_some() || self.insecure {
            let mut tls = TlsConfig::new();
            tls.ca_cert.clone_from(&self.ca_cert);
            tls.insecure_skip_verify = self.insecure;
            config = config.with_tls(tls);
        }

        let mut settings = BackendSettings::new(kind, name)
            .with_credentials(
                pick(self.username.as_deref(), inputs.get("USERNAME")).map(String::from),
                pick(self.password.as_deref(), inputs.get("PASSWORD")).map(String::from),
            )
            .with_config(config);
        if let Some(url) = non_empty(self.digitalocean_api_url.as_deref()) {
            settings = settings.with_digitalocean_api_url(url);
        }

        Ok(settings)
    }
}

/// GitHub Actions inputs (`INPUT_<NAME>` variables).
#[derive(Debug, Default, Clone)]
pub struct ActionInputs {
    values: HashMap<String, String>,
}

impl ActionInputs {
    /// Captures the `INPUT_*` variables of the current process.
    pub fn from_env() -> Self {
        std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix("INPUT_")
                    .map(|name| (name.to_string(), value))
            })
            .collect()
    }

    /// Returns an input by its upper-case name, if set and non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        non_empty(self.values.get(name).map(String::as_str))
    }
}

impl FromIterator<(String, String)> for ActionInputs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// First non-empty value of a flag/`TAGSWEEP_*` value and an action input.
pub fn pick<'a>(value: Option<&'a str>, input: Option<&'a str>) -> Option<&'a str> {
    non_empty(value).or_else(|| non_empty(input))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
