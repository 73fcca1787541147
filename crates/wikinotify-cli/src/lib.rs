//! wikinotify CLI - announce new and updated Wiki.js pages in Telegram
//!
//! One invocation is one check pass. Configuration errors and a failure to
//! write the cache end the process with a non-zero status; a pass that could
//! not classify every page is logged and still exits successfully so the
//! scheduler simply tries again next time.
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use wikinotify_core::{
    ChangeDetector, CheckOutcome, Config, JsonCacheStore, LogNotifier, Notifier, TelegramNotifier,
    WikiClient,
};

mod cli;
mod utils;

pub use cli::Cli;

use crate::utils::initialize_logging;

/// Execute one wiki update check with the current arguments and environment.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, an HTTP client cannot be
/// built, or the cache file cannot be written.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;

    let config = cli.to_config()?;
    config.validate().context("Invalid configuration")?;

    info!("Starting wiki update check");
    debug!(
        wiki = %config.wiki.graphql_url,
        cache = %config.cache_file.display(),
        interval_minutes = config.check_interval_minutes,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let outcome = if cli.dry_run {
        check(&config, LogNotifier, true).await?
    } else {
        check(&config, TelegramNotifier::new(&config)?, false).await?
    };
    log_outcome(&outcome);

    info!("Check finished");
    Ok(())
}

async fn check<N>(config: &Config, notifier: N, dry_run: bool) -> Result<CheckOutcome>
where
    N: Notifier + Sync,
{
    let detector = ChangeDetector::new(
        config,
        WikiClient::new(config)?,
        notifier,
        JsonCacheStore::new(&config.cache_file),
    )
    .dry_run(dry_run);

    detector
        .run()
        .await
        .with_context(|| format!("Failed to save cache to {}", config.cache_file.display()))
}

fn log_outcome(outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::Completed(report) => {
            if report.fetch_failed {
                warn!("Page list unavailable, nothing was checked");
            }
            info!(
                pages = report.pages,
                baseline = report.baseline,
                created = report.created,
                updated = report.updated,
                unchanged = report.unchanged,
                failed_notifications = report.failed_notifications,
                cache_saved = report.cache_saved,
                "Check complete"
            );
        },
        CheckOutcome::Aborted { error, partial } => {
            warn!(
                error = %error,
                created = partial.created,
                updated = partial.updated,
                "Check aborted, will retry on the next run"
            );
        },
    }
}
