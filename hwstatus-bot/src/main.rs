//! hwstatus Bot
//!
//! Watches the review status of a homework submission and reports every
//! change to a Telegram chat.
//!
//! Architecture:
//! - Configuration: Load credentials and timing from the environment (or `.env`) once
//! - Repositories: HTTP communication with the review API and Telegram
//! - Scheduler: Poll cycle, error classification and watermark bookkeeping
//!
//! The bot polls the review API for status changes newer than its watermark,
//! renders each verdict and delivers it, then sleeps for a fixed interval.
//! Recoverable failures are logged and retried on the next cycle.

mod config;
mod logging;
mod repository;
mod scheduler;

use anyhow::{Context, Result};
use clap::Parser;
use hwstatus_core::Watermark;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::repository::{HttpStatusSource, TelegramNotifier};
use crate::scheduler::{CycleOutcome, StatusPoller};

#[derive(Parser)]
#[command(name = "hwstatus-bot")]
#[command(about = "Reports homework review status changes to Telegram", long_about = None)]
struct Cli {
    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Report every record of a reply instead of only the newest one
    #[arg(long)]
    fan_out: bool,

    /// Start from this Unix timestamp instead of the current time
    #[arg(long, value_name = "TIMESTAMP")]
    from: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let _log_guard = logging::init();

    let cli = Cli::parse();

    info!("Starting hwstatus bot");

    // Load configuration
    let config = match load_config() {
        Ok(config) => {
            let fan_out = cli.fan_out || config.fan_out;
            config.with_fan_out(fan_out)
        }
        Err(e) => {
            error!(critical = true, "Refusing to start: {:#}", e);
            return Err(e);
        }
    };
    info!(
        "Loaded configuration: destination_id={}, poll_interval={:?}",
        config.destination_id, config.poll_interval
    );

    // One HTTP client shared by both repositories
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let source = Arc::new(HttpStatusSource::with_client(
        config.source_endpoint.clone(),
        config.source_credential.clone(),
        http.clone(),
    ));
    let notifier = Arc::new(TelegramNotifier::with_client(
        config.notifier_api_url.clone(),
        config.notifier_credential.clone(),
        config.destination_id.clone(),
        http,
    ));

    let mut poller = StatusPoller::new(&config, source, notifier);
    if let Some(from) = cli.from {
        poller = poller.with_watermark(Watermark::from_unix(from));
    }

    if cli.once {
        return match poller.run_cycle().await {
            CycleOutcome::Failed(e) => Err(anyhow::Error::new(e).context("Poll cycle failed")),
            outcome => {
                info!(?outcome, "Single poll cycle finished");
                Ok(())
            }
        };
    }

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    poller.run(shutdown).await;

    info!(watermark = %poller.watermark(), "hwstatus bot stopped");
    Ok(())
}

/// Loads and validates configuration from the environment and `.env`
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration from environment")?;
    config.validate()?;
    Ok(config)
}

/// Cancels `shutdown` on Ctrl-C
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, finishing current cycle");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}
