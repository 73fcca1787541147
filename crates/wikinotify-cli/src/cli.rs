//! # CLI Structure and Argument Parsing
//!
//! `wikinotify` takes no positional arguments: every setting has a long flag
//! and an environment variable, so a cron entry or a systemd timer can run
//! the bare binary with the settings in its environment.
//!
//! ```bash
//! # One check with settings from the environment
//! wikinotify
//!
//! # Preview what would be sent without touching Telegram or the cache
//! wikinotify --dry-run --verbose
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wikinotify_core::config::{
    DEFAULT_CACHE_FILE, DEFAULT_CHECK_INTERVAL_MINUTES, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TELEGRAM_API_URL,
};
use wikinotify_core::{Config, MessageLabels, TelegramConfig, WikiConfig};

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

/// Main CLI structure for the `wikinotify` command
#[derive(Parser, Clone, Debug)]
#[command(name = "wikinotify")]
#[command(version)]
#[command(
    about = "Check a Wiki.js instance once and announce new or updated pages in Telegram",
    long_about = None
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Wiki.js GraphQL endpoint
    #[arg(long, env = "WIKI_GRAPHQL_URL", value_name = "URL")]
    pub wiki_graphql_url: String,

    /// Bearer token for the Wiki.js API
    #[arg(long, env = "WIKI_API_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub wiki_api_token: String,

    /// Public base URL of the wiki, prefixed to page paths in links
    #[arg(long, env = "SITE_URL", value_name = "URL")]
    pub site_url: String,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub telegram_bot_token: String,

    /// Destination channel id or @username
    #[arg(long, env = "TELEGRAM_CHANNEL_ID", value_name = "ID")]
    pub telegram_channel_id: String,

    /// Forum topic inside the channel
    #[arg(long, env = "TELEGRAM_THREAD_ID", value_name = "ID")]
    pub telegram_thread_id: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", value_name = "URL", default_value = DEFAULT_TELEGRAM_API_URL)]
    pub telegram_api_url: String,

    /// Only updates newer than this many minutes are announced
    #[arg(long, env = "CHECK_INTERVAL_MINUTES", value_name = "MINUTES", default_value_t = DEFAULT_CHECK_INTERVAL_MINUTES)]
    pub check_interval_minutes: u32,

    /// Where page timestamps are kept between runs
    #[arg(long, env = "CACHE_FILE", value_name = "PATH", default_value = DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    /// Log file, written in addition to stdout
    #[arg(long, env = "LOG_FILE", value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Timeout for each HTTP request
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", value_name = "SECONDS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Log messages instead of sending them and leave the cache untouched
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Emit log lines as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Build the run configuration from the parsed flags.
    pub fn to_config(&self) -> Result<Config> {
        let thread_id = match self.telegram_thread_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .with_context(|| format!("TELEGRAM_THREAD_ID must be an integer, got '{raw}'"))?,
            ),
        };

        Ok(Config {
            wiki: WikiConfig {
                graphql_url: self.wiki_graphql_url.clone(),
                api_token: self.wiki_api_token.clone(),
            },
            telegram: TelegramConfig {
                api_url: self.telegram_api_url.clone(),
                bot_token: self.telegram_bot_token.clone(),
                channel_id: self.telegram_channel_id.clone(),
                thread_id,
            },
            site_url: self.site_url.clone(),
            check_interval_minutes: self.check_interval_minutes,
            cache_file: self.cache_file.clone(),
            request_timeout_secs: self.request_timeout_secs,
            labels: MessageLabels::default(),
        })
    }
}
