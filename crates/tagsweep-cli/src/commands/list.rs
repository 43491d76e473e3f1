//! List command: print a repository's tags without deleting anything.

use anyhow::{Context, Result};
use clap::Args;
use tagsweep_core::RetentionPolicy;
use tagsweep_engine::{Cleaner, CleanupOptions};
use tagsweep_registry::select_backend;
use tracing::info;

use super::{ActionInputs, OutputFormat, RegistryArgs};

/// Arguments for the list command.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,
}

/// Runs the list command.
pub async fn execute(args: &ListArgs) -> Result<()> {
    let settings = args.registry.backend_settings(&ActionInputs::from_env())?;
    let backend = select_backend(&settings).context("Invalid registry configuration")?;

    info!(repository = %backend.repository(), "Listing tags");

    let options =
        CleanupOptions::new(RetentionPolicy::new(0)).with_concurrency(args.registry.concurrency);
    let listing = Cleaner::new(backend, options)?
        .list()
        .await
        .context("Listing failed")?;

    match args.registry.format {
        OutputFormat::Text => print!("{}", listing.render_text()),
        OutputFormat::Json => println!("{}", listing.to_json()?),
    }

    Ok(())
}
