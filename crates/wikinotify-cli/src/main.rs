//! wikinotify - announce new and updated Wiki.js pages in Telegram
//!
//! Runs a single check and exits; schedule it with cron or a systemd timer.

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    wikinotify_cli::run().await
}
