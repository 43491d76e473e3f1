//! tagsweep CLI - keeps the newest container image tags and deletes the rest.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagsweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => commands::clean::execute(&cli.clean).await,
        Some(Commands::Clean(args)) => commands::clean::execute(&args).await,
        Some(Commands::List(args)) => commands::list::execute(&args).await,
        Some(Commands::Version) => {
            println!("tagsweep {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
