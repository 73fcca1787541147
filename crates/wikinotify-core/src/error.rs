//! Error types and handling for wikinotify-core operations.
//!
//! One error enum covers every failure a check pass can hit. Errors are
//! categorized so the detector can log them with a stable `category` field,
//! and transport errors report whether a later run is likely to succeed.
//!
//! ## Error Categories
//!
//! - **Network Errors**: HTTP transport failures against the wiki or Telegram
//! - **API Errors**: non-success HTTP statuses and GraphQL error payloads
//! - **Timestamp Errors**: page timestamps that are not ISO-8601
//! - **Storage Errors**: cache persistence failures
//! - **Configuration Errors**: missing or invalid settings
//!
//! ## Example
//!
//! ```rust
//! use wikinotify_core::Error;
//!
//! let err = Error::Timestamp("yesterday".to_string());
//! assert_eq!(err.category(), "timestamp");
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

/// The main error type for wikinotify-core operations.
///
/// All fallible functions in this crate return `Result<T, Error>`. The
/// network variant keeps the underlying `reqwest::Error` so the full source
/// chain is available to log formatters.
#[derive(Error, Debug)]
pub enum Error {
    /// Network operation failed.
    ///
    /// Raised by `reqwest` for connection failures, timeouts and body
    /// decoding errors when talking to the wiki or to Telegram.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A remote API answered with a non-success HTTP status.
    ///
    /// The response body is kept verbatim because both Wiki.js and Telegram
    /// put the actionable explanation there (bad token, unknown chat, ...).
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The GraphQL endpoint answered 200 but reported errors instead of data.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// A page or cache timestamp could not be parsed as ISO-8601.
    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    /// Writing the cache file or creating its directory failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might go away on a later run.
    ///
    /// Nothing in this crate retries; the flag only feeds log output so an
    /// operator can tell a flaky network apart from a broken token.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get the error category as a string identifier for structured logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Api { .. } => "api",
            Self::GraphQl(_) => "graphql",
            Self::Timestamp(_) => "timestamp",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
