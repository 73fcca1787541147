//! Run configuration for a single check pass.
//!
//! The configuration is built once at startup (the CLI fills it from flags
//! and environment variables) and handed by reference to the cache store,
//! the wiki client and the notifier. Nothing in this crate reads the
//! process environment on its own.
//!
//! ## Example
//!
//! ```rust
//! use wikinotify_core::{Config, TelegramConfig, WikiConfig};
//!
//! let config = Config {
//!     wiki: WikiConfig {
//!         graphql_url: "https://wiki.example.org/graphql".to_string(),
//!         api_token: "secret".to_string(),
//!     },
//!     telegram: TelegramConfig::new("123:abc", "@wiki_updates"),
//!     site_url: "https://wiki.example.org/".to_string(),
//!     ..Config::default()
//! };
//! config.validate()?;
//! assert_eq!(config.check_interval_minutes, 5);
//! # Ok::<(), wikinotify_core::Error>(())
//! ```

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default update-eligibility window in minutes.
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u32 = 5;
/// Default cache file, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = ".wiki_cache.json";
/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything one check pass needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source API settings
    pub wiki: WikiConfig,
    /// Notification destination settings
    pub telegram: TelegramConfig,
    /// Base URL prefixed to page paths when building links
    pub site_url: String,
    /// Width of the update-eligibility window, in minutes
    pub check_interval_minutes: u32,
    /// Where the page cache is persisted
    pub cache_file: PathBuf,
    /// Timeout applied to every outbound HTTP request, in seconds
    pub request_timeout_secs: u64,
    /// Wording used in notification messages
    pub labels: MessageLabels,
}

/// Wiki.js GraphQL endpoint and credential.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// GraphQL endpoint, e.g. `https://wiki.example.org/graphql`
    pub graphql_url: String,
    /// Bearer token sent with every request
    pub api_token: String,
}

/// Telegram Bot API destination.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API base URL; overridable so tests can point at a mock server
    pub api_url: String,
    /// Bot token (`123456:ABC...`)
    pub bot_token: String,
    /// Channel id (`-100...`) or public username (`@channel`)
    pub channel_id: String,
    /// Forum topic inside the channel, if any
    pub thread_id: Option<i64>,
}

impl TelegramConfig {
    /// Destination on the public Bot API with no thread.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            bot_token: bot_token.into(),
            channel_id: channel_id.into(),
            thread_id: None,
        }
    }
}

/// Fixed words placed around page data in a notification.
///
/// Defaults match the wording the wiki's readers are used to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLabels {
    /// Heading of a new-page message
    pub new_page: String,
    /// Heading of an updated-page message
    pub updated_page: String,
    /// Link text
    pub read: String,
}

impl Default for MessageLabels {
    fn default() -> Self {
        Self {
            new_page: "Новая статья".to_string(),
            updated_page: "Обновлена статья".to_string(),
            read: "Читать".to_string(),
        }
    }
}

/// Empty endpoints and credentials with default tunables.
///
/// Meant as a `..` base for struct literals; it does not pass
/// [`Config::validate`] on its own.
impl Default for Config {
    fn default() -> Self {
        Self {
            wiki: WikiConfig {
                graphql_url: String::new(),
                api_token: String::new(),
            },
            telegram: TelegramConfig::new("", ""),
            site_url: String::new(),
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            labels: MessageLabels::default(),
        }
    }
}

impl Config {
    /// Check that every required value is present and well formed.
    pub fn validate(&self) -> Result<()> {
        require_url("WIKI_GRAPHQL_URL", &self.wiki.graphql_url)?;
        require("WIKI_API_TOKEN", &self.wiki.api_token)?;
        require_url("SITE_URL", &self.site_url)?;
        require_url("TELEGRAM_API_URL", &self.telegram.api_url)?;
        require("TELEGRAM_BOT_TOKEN", &self.telegram.bot_token)?;
        require("TELEGRAM_CHANNEL_ID", &self.telegram.channel_id)?;

        if self.check_interval_minutes == 0 {
            return Err(Error::Config(
                "CHECK_INTERVAL_MINUTES must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "REQUEST_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The update-eligibility window.
    #[must_use]
    pub fn check_interval(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::minutes(i64::from(self.check_interval_minutes))
    }

    /// HTTP timeout for outbound requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} is not set")));
    }
    Ok(())
}

fn require_url(name: &str, value: &str) -> Result<()> {
    require(name, value)?;
    Url::parse(value).map_err(|e| Error::Config(format!("{name} is not a valid URL: {e}")))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            wiki: WikiConfig {
                graphql_url: "https://wiki.example.org/graphql".to_string(),
                api_token: "token".to_string(),
            },
            telegram: TelegramConfig::new("123:abc", "-1001234567890"),
            site_url: "https://wiki.example.org/".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.check_interval_minutes, 5);
        assert_eq!(config.cache_file, PathBuf::from(".wiki_cache.json"));
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.thread_id, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.labels.read, "Читать");
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let mut config = valid_config();
        config.wiki.api_token = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("WIKI_API_TOKEN"));
    }

    #[test]
    fn test_malformed_url_is_rejected() {
        let mut config = valid_config();
        config.site_url = "wiki.example.org".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("SITE_URL"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = valid_config();
        config.check_interval_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_interval_in_minutes() {
        let mut config = valid_config();
        config.check_interval_minutes = 15;
        assert_eq!(config.check_interval(), chrono::TimeDelta::minutes(15));
    }
}
