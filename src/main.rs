use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod command;
mod config;
mod error;
mod extension;
mod youtrack;

use cli::{Cli, Commands};
use config::ConfigStore;
use extension::{Changeset, IssueTrackerExtension};
use youtrack::YouTrackExtension;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli::resolve_config_path(cli.config)?;
    let mut store = ConfigStore::load(&config_path)?;
    store
        .apply_overrides(&cli.overrides)
        .context("Invalid --set override")?;
    debug!("Loaded configuration from {:?}", config_path);

    let extension = YouTrackExtension::new(&store);
    debug!("Resolved configuration: {:?}", extension.config());
    let extension: &dyn IssueTrackerExtension = &extension;

    let result = match cli.command {
        Commands::Config => command::run_config(&store),
        Commands::TestConnection => command::run_test_connection(extension, &store).await,
        Commands::Pending { assignee } => {
            command::run_pending(extension, assignee.as_deref()).await
        }
        Commands::Branch { branches } => command::run_branch(extension, &branches).await,
        Commands::Load { task_ids } => command::run_load(extension, &task_ids).await,
        Commands::Checkin {
            message,
            tasks,
            changeset,
            branch,
        } => {
            let changeset = Changeset {
                id: changeset,
                branch,
                owner: whoami(),
                comment: message,
            };
            command::run_checkin(extension, changeset, &tasks).await
        }
        Commands::Start { task_id, assignee } => {
            command::run_start(extension, &task_id, &assignee).await
        }
        Commands::Browse { task_id } => command::run_browse(extension, &task_id),
    };

    extension.disconnect().await;
    result
}

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}
