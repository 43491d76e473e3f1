//! Clean command: keep the newest tags and delete the rest.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tagsweep_core::{RetentionPolicy, SkipPolicy};
use tagsweep_engine::{Cleaner, CleanupOptions};
use tagsweep_registry::select_backend;
use tracing::info;

use super::{pick, ActionInputs, OutputFormat, RegistryArgs};

/// Arguments for the clean command.
#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Number of most recent tags to keep
    #[arg(long, env = "TAGSWEEP_MAX_IMAGES", allow_hyphen_values = true)]
    pub max_images: Option<String>,

    /// Tags never deleted: digest-prefix (any sha-*) or commit-tag (sha-<hex>)
    #[arg(long, env = "TAGSWEEP_SKIP_POLICY")]
    pub skip_policy: Option<String>,

    /// Stop issuing deletions after this many seconds
    #[arg(long, env = "TAGSWEEP_DEADLINE")]
    pub deadline: Option<u64>,

    /// Report what would be deleted without deleting
    #[arg(long, env = "TAGSWEEP_DRY_RUN")]
    pub dry_run: bool,
}

/// Run configuration after every input has been validated.
#[derive(Debug)]
pub struct CleanPlan {
    /// Backend selection inputs.
    pub settings: tagsweep_registry::BackendSettings,
    /// Engine options.
    pub options: CleanupOptions,
}

impl CleanArgs {
    /// Validates all inputs. Nothing here touches the network.
    pub fn plan(&self, inputs: &ActionInputs) -> Result<CleanPlan> {
        let mut settings = self.registry.backend_settings(inputs)?;

        let Some(max_images) = pick(self.max_images.as_deref(), inputs.get("MAX-IMAGES")) else {
            bail!("Missing retention count (--max-images, TAGSWEEP_MAX_IMAGES or INPUT_MAX-IMAGES)");
        };
        let retention = RetentionPolicy::parse(max_images).context("Invalid --max-images")?;

        let skip_policy = pick(self.skip_policy.as_deref(), None)
            .map(str::parse::<SkipPolicy>)
            .transpose()
            .context("Invalid --skip-policy")?;
        settings = settings.with_skip_policy(skip_policy);

        let options = CleanupOptions::new(retention)
            .with_concurrency(self.registry.concurrency)
            .with_dry_run(self.dry_run)
            .with_deadline(self.deadline.map(Duration::from_secs));

        Ok(CleanPlan { settings, options })
    }
}

/// Runs the clean command.
pub async fn execute(args: &CleanArgs) -> Result<()> {
    let plan = args.plan(&ActionInputs::from_env())?;
    let backend = select_backend(&plan.settings).context("Invalid registry configuration")?;

    info!(
        repository = %backend.repository(),
        max_images = plan.options.retention.count(),
        "Cleaning repository"
    );

    let cleaner = Cleaner::new(backend, plan.options)?;
    let report = cleaner.run().await.context("Cleanup failed")?;

    match args.registry.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
