//! Argument parsing, process setup and the per-title loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use gaffer_config::GafferConfig;
use gaffer_portal::{Portal, login_from_config};
use gaffer_telemetry::{GlobalContextGuard, LogFormat, LogGuards, LoggingConfig, init_logging};
use gaffer_transfer::{AsperaClient, TransferClient};
use tracing::info;

use crate::artifacts::ArtifactWriter;
use crate::notify::Notifier;
use crate::pipeline::Pipeline;

const BUILD_SHA: &str = match option_env!("GAFFER_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// Fetch studio deliverables for one or more titles.
#[derive(Debug, Parser)]
#[command(name = "gaffer", version, about = "Fetch studio deliverables for one or more titles")]
pub struct Cli {
    /// Title identifiers to process, in order.
    #[arg(value_name = "TITLE_ID")]
    pub titles: Vec<String>,
    /// YAML configuration file; `GAFFER_CONFIG` is used when absent.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Directory holding the persisted session.
    #[arg(long, value_name = "DIR")]
    pub profile_dir: Option<PathBuf>,
    /// Download root handed to the transfer client.
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
    /// Directory receiving per-title JSON artifacts.
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,
    /// Stop after manifest resolution.
    #[arg(long)]
    pub no_transfer: bool,
}

impl Cli {
    /// Layer the command-line flags over a loaded configuration.
    pub fn apply_overrides(&self, config: &mut GafferConfig) {
        if let Some(dir) = &self.profile_dir {
            config.storage.profile_dir.clone_from(dir);
        }
        if let Some(dir) = &self.artifacts_dir {
            config.storage.artifacts_dir.clone_from(dir);
        }
        if let Some(dir) = &self.download_dir {
            config.transfer.download_dir.clone_from(dir);
        }
        if self.no_transfer {
            config.transfer.enabled = false;
        }
    }
}

/// Parse the process arguments and run. Returns the process exit code.
pub async fn run() -> i32 {
    run_with(Cli::parse()).await
}

/// Run with already parsed arguments. Returns the process exit code.
pub async fn run_with(cli: Cli) -> i32 {
    if cli.titles.is_empty() {
        eprintln!("{}", Cli::command().render_usage());
        eprintln!("error: at least one TITLE_ID is required");
        return 1;
    }

    let (config, _logs) = match setup(&cli) {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("error: {err:#}");
            return 1;
        }
    };
    let _context = GlobalContextGuard::new("run");

    let pipeline = match build_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("error: {err:#}");
            return 1;
        }
    };

    info!(titles = cli.titles.len(), "starting run");
    for title_id in &cli.titles {
        match pipeline.run_title(title_id).await {
            Ok(_) => println!("{title_id}: ok"),
            Err(err) => println!("{title_id}: failed ({})", err.stage),
        }
    }
    0
}

fn setup(cli: &Cli) -> anyhow::Result<(GafferConfig, LogGuards)> {
    let mut config =
        gaffer_config::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let logs = init_logging(&LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::from_setting(config.logging.format.as_deref()),
        build_sha: BUILD_SHA,
        directory: config.logging.directory.as_deref(),
    })
    .context("failed to initialise logging")?;
    Ok((config, logs))
}

/// Wire the pipeline from configuration.
///
/// # Errors
///
/// Returns an error when the login collaborator, the portal or the transfer client
/// cannot be built.
pub fn build_pipeline(config: &GafferConfig) -> anyhow::Result<Pipeline> {
    let login = login_from_config(&config.login).context("invalid login configuration")?;
    let portal = Portal::from_config(config, login).context("failed to build portal client")?;
    let transfer: Option<Arc<dyn TransferClient>> = if config.transfer.enabled {
        let client =
            AsperaClient::from_config(&config.transfer).context("failed to locate ascp")?;
        Some(Arc::new(client))
    } else {
        None
    };
    Ok(Pipeline::new(
        portal,
        transfer,
        ArtifactWriter::new(config.storage.artifacts_dir.clone()),
        Notifier::from_config(&config.notify),
    ))
}
