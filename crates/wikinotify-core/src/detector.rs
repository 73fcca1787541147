//! Change detection: decide, per page, whether readers need to hear about it.
//!
//! A pass loads the cache, fetches the page list, classifies every page and
//! persists the cache once at the end. Classification follows four rules:
//!
//! 1. **Baseline**: the cache was empty when the pass began. The page is
//!    recorded silently so a fresh deployment does not flood the channel.
//! 2. **Created**: the page id is not in the cache.
//! 3. **Updated**: the page's `updatedAt` lies inside the check window
//!    (`now - interval`) and differs from the cached value.
//! 4. **Unchanged**: anything else, including edits older than the window.
//!
//! The window assumes the scheduler runs at least once per interval. An
//! edit made while a run was overdue by more than the interval is missed.
//!
//! Notification failures are logged and counted but never undo the cache
//! update for that page. An error while classifying (for example an
//! unparseable timestamp) aborts the pass before anything is written.

use crate::cache::{CacheStore, PageCache};
use crate::notify::{ChangeKind, Notifier, format_message};
use crate::source::PageSource;
use crate::{CacheEntry, Config, Error, MessageLabels, Page, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, error, info};

/// Classification of one fetched page against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    /// First run: record without notifying
    Baseline,
    /// Not seen before: notify and record
    Created,
    /// Edited inside the check window: notify and refresh `updatedAt`
    Updated,
    /// Nothing to do
    Unchanged,
}

/// Counters describing one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Pages returned by the wiki
    pub pages: usize,
    /// Pages recorded silently on a first run
    pub baseline: usize,
    /// Pages announced as new
    pub created: usize,
    /// Pages announced as updated
    pub updated: usize,
    /// Pages that needed no action
    pub unchanged: usize,
    /// Notifications the sink failed to deliver
    pub failed_notifications: usize,
    /// Whether the page list could not be fetched
    pub fetch_failed: bool,
    /// Whether the cache was written at the end of the pass
    pub cache_saved: bool,
}

impl CheckReport {
    /// Notifications attempted during the pass
    #[must_use]
    pub const fn notifications(&self) -> usize {
        self.created + self.updated
    }
}

/// How a pass ended.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Every page was classified; the cache was saved unless this was a dry run.
    Completed(CheckReport),
    /// Classification failed part way; the cache was left untouched.
    Aborted {
        /// What stopped the pass
        error: Error,
        /// Counters up to the failure
        partial: CheckReport,
    },
}

/// Parse an ISO-8601 timestamp as reported by Wiki.js.
///
/// RFC 3339 forms (`Z` or a numeric offset) are accepted; a date-time
/// without an offset is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::Timestamp(raw.to_string()))
}

/// Decide what to do with one page.
///
/// The page timestamp is parsed before anything else, so malformed data is
/// reported even on a first run.
pub fn classify(
    page: &Page,
    cached: Option<&CacheEntry>,
    is_first_run: bool,
    cutoff: DateTime<Utc>,
) -> Result<PageChange> {
    let updated_at = parse_timestamp(&page.updated_at)?;

    if is_first_run {
        return Ok(PageChange::Baseline);
    }

    let Some(cached) = cached else {
        return Ok(PageChange::Created);
    };

    let cached_updated_at = parse_timestamp(&cached.updated_at)?;
    if updated_at > cutoff && updated_at != cached_updated_at {
        Ok(PageChange::Updated)
    } else {
        Ok(PageChange::Unchanged)
    }
}

/// Runs check passes against a page source, a notifier and a cache store.
pub struct ChangeDetector<S, N, C> {
    source: S,
    notifier: N,
    store: C,
    site_url: String,
    check_interval: TimeDelta,
    labels: MessageLabels,
    persist: bool,
}

impl<S, N, C> ChangeDetector<S, N, C>
where
    S: PageSource + Sync,
    N: Notifier + Sync,
    C: CacheStore,
{
    /// Creates a detector using the link base, window and labels from `config`.
    pub fn new(config: &Config, source: S, notifier: N, store: C) -> Self {
        Self {
            source,
            notifier,
            store,
            site_url: config.site_url.clone(),
            check_interval: config.check_interval(),
            labels: config.labels.clone(),
            persist: true,
        }
    }

    /// Skip writing the cache at the end of the pass.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.persist = !dry_run;
        self
    }

    /// The cache store this detector writes to
    pub const fn store(&self) -> &C {
        &self.store
    }

    /// The notifier this detector sends through
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one pass against the current wall clock.
    pub async fn run(&self) -> Result<CheckOutcome> {
        self.run_at(Utc::now()).await
    }

    /// Run one pass as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Only a failure to persist the cache is returned as `Err`. Fetch and
    /// notification failures are logged and folded into the report, and a
    /// classification failure yields [`CheckOutcome::Aborted`].
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CheckOutcome> {
        let mut cache = self.store.load();
        let mut report = CheckReport::default();

        if let Err(error) = self.detect(&mut cache, now, &mut report).await {
            error!(
                category = error.category(),
                error = %error,
                "Wiki update check failed, cache not saved"
            );
            return Ok(CheckOutcome::Aborted {
                error,
                partial: report,
            });
        }

        if self.persist {
            self.store.save(&cache)?;
            report.cache_saved = true;
        } else {
            debug!("Dry run, cache not saved");
        }

        Ok(CheckOutcome::Completed(report))
    }

    async fn detect(
        &self,
        cache: &mut PageCache,
        now: DateTime<Utc>,
        report: &mut CheckReport,
    ) -> Result<()> {
        let cutoff = now - self.check_interval;

        let pages = match self.source.fetch_pages().await {
            Ok(pages) => pages,
            Err(e) => {
                error!(
                    category = e.category(),
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Failed to fetch pages from wiki"
                );
                report.fetch_failed = true;
                Vec::new()
            },
        };
        report.pages = pages.len();

        let is_first_run = cache.is_empty();
        if is_first_run && !pages.is_empty() {
            info!(pages = pages.len(), "Cache is empty, recording baseline without notifications");
        }

        for page in &pages {
            let key = page.id.cache_key();
            match classify(page, cache.get(&key), is_first_run, cutoff)? {
                PageChange::Baseline => {
                    cache.insert(key, CacheEntry::from(page));
                    report.baseline += 1;
                },
                PageChange::Created => {
                    info!(page_id = %key, title = %page.title, "New page");
                    self.notify(ChangeKind::Created, page, report).await;
                    cache.insert(key, CacheEntry::from(page));
                    report.created += 1;
                },
                PageChange::Updated => {
                    info!(page_id = %key, title = %page.title, updated_at = %page.updated_at, "Updated page");
                    self.notify(ChangeKind::Updated, page, report).await;
                    cache.touch(&key, &page.updated_at);
                    report.updated += 1;
                },
                PageChange::Unchanged => report.unchanged += 1,
            }
        }

        Ok(())
    }

    async fn notify(&self, kind: ChangeKind, page: &Page, report: &mut CheckReport) {
        let text = format_message(kind, page, &self.site_url, &self.labels);
        if let Err(e) = self.notifier.send(&text).await {
            error!(
                page_id = %page.id,
                category = e.category(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Failed to send notification"
            );
            report.failed_notifications += 1;
        }
    }
}
