//! # Tagsweep Registry
//!
//! Container registry clients and cleanup backends.
//!
//! This crate talks to registries on behalf of the cleanup engine: it lists
//! tags, reads image creation times and deletes tags. Each supported
//! registry is wrapped in a [`RegistryBackend`] chosen once per run by
//! [`select_backend`].
//!
//! ## Features
//!
//! - **Distribution API**: Paginated tag listing, manifest and index
//!   resolution, manifest deletion
//! - **Token Authentication**: Basic credentials and `WWW-Authenticate`
//!   bearer token exchange, cached per scope
//! - **DigitalOcean**: Tag deletion through the DigitalOcean REST API
//! - **Skip Policies**: Each backend carries the rule protecting tags it
//!   must not delete
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tagsweep_registry::{select_backend, BackendSettings, RegistryKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = BackendSettings::new(RegistryKind::Ghcr, "acme/app")
//!         .with_credentials(Some("acme-bot".to_string()), Some("ghp_token".to_string()));
//!     let backend = select_backend(&settings)?;
//!
//!     for tag in backend.list_tags().await? {
//!         let created = backend.fetch_created_at(&tag).await?;
//!         println!("{tag}: {created:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  dyn RegistryBackend                      │
//! │  ┌──────────────────┐        ┌─────────────────────────┐  │
//! │  │   OciBackend     │        │  DigitalOceanBackend    │  │
//! │  │ RegistryClient   │        │ RegistryClient (reads)  │  │
//! │  │                  │        │ DigitalOceanApi (delete)│  │
//! │  └──────────────────┘        └─────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```

mod auth;
mod backend;
mod client;
mod config;
mod digitalocean;
mod error;
mod kind;
mod oci;
mod reference;

pub use auth::{Credential, DOCR_USERNAME};
pub use backend::{
    select_backend, BackendSettings, DigitalOceanBackend, OciBackend, RegistryBackend,
};
pub use client::{RegistryClient, DELETE_ACTIONS};
pub use config::{RegistryConfig, TlsConfig, DEFAULT_PAGE_SIZE};
pub use digitalocean::{DigitalOceanApi, DIGITALOCEAN_API_URL};
pub use error::RegistryError;
pub use kind::{RegistryKind, DOCR_HOST, GHCR_HOST};
pub use oci::{
    Descriptor, ErrorResponse, ImageConfig, ManifestDocument, MediaType, Platform,
    RegistryApiError, TagList,
};
pub use reference::{validate_tag, RepositoryReference, DOCKER_HUB_API_HOST, DOCKER_HUB_REGISTRY};
