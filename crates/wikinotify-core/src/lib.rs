//! # wikinotify-core
//!
//! Core functionality for wikinotify - a one-shot checker that announces new
//! and recently updated Wiki.js pages in a Telegram channel.
//!
//! A check pass loads a small JSON cache of page timestamps, fetches the page
//! list from the wiki's GraphQL API, classifies every page against the cache
//! and sends a `MarkdownV2` message for each new or updated one. The cache is
//! written back once, at the end of a pass that classified every page.
//!
//! ## Architecture
//!
//! - **Configuration**: [`Config`], built once and passed to every component
//! - **Cache**: [`CacheStore`] trait with the JSON file implementation [`JsonCacheStore`]
//! - **Source**: [`PageSource`] trait with the Wiki.js client [`WikiClient`]
//! - **Notifications**: [`Notifier`] trait with [`TelegramNotifier`] and [`LogNotifier`]
//! - **Detection**: [`ChangeDetector`] drives a pass and reports a [`CheckOutcome`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wikinotify_core::{
//!     ChangeDetector, CheckOutcome, Config, JsonCacheStore, TelegramNotifier, WikiClient,
//! };
//!
//! # async fn demo(config: Config) -> wikinotify_core::Result<()> {
//! config.validate()?;
//! let detector = ChangeDetector::new(
//!     &config,
//!     WikiClient::new(&config)?,
//!     TelegramNotifier::new(&config)?,
//!     JsonCacheStore::new(&config.cache_file),
//! );
//!
//! match detector.run().await? {
//!     CheckOutcome::Completed(report) => println!("{} notifications", report.notifications()),
//!     CheckOutcome::Aborted { error, .. } => eprintln!("check aborted: {error}"),
//! }
//! # Ok(())
//! # }
//! ```

/// Page cache and its persistence
pub mod cache;
/// Run configuration
pub mod config;
/// Change classification and the check pass
pub mod detector;
/// Error types and result aliases
pub mod error;
mod http;
/// Message formatting and delivery
pub mod notify;
/// Wiki.js page listing
pub mod source;
/// Core data types
pub mod types;

pub use cache::{CacheStore, JsonCacheStore, PageCache};
pub use config::{Config, MessageLabels, TelegramConfig, WikiConfig};
pub use detector::{ChangeDetector, CheckOutcome, CheckReport, PageChange, classify};
pub use error::{Error, Result};
pub use notify::{ChangeKind, LogNotifier, Notifier, TelegramNotifier};
pub use source::{PageSource, WikiClient};
pub use types::*;
