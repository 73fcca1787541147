use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity of a wiki page.
///
/// Wiki.js reports numeric ids, but the field is accepted as either a JSON
/// integer or a string. The [`Display`](fmt::Display) form is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageId {
    /// Integer id as returned by Wiki.js.
    Number(i64),
    /// String id.
    Text(String),
}

impl PageId {
    /// The key this page is stored under in the cache.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PageId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Snapshot of one page as reported by the wiki's `pages.list` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page identity
    pub id: PageId,
    /// Page title; Wiki.js may report `null`, which reads as `""`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Short description; `null` and `""` both mean "none"
    #[serde(default)]
    pub description: Option<String>,
    /// Path relative to the site root, e.g. `en/guide/install`
    pub path: String,
    /// Creation timestamp, ISO-8601, kept verbatim
    pub created_at: String,
    /// Last update timestamp, ISO-8601, kept verbatim
    pub updated_at: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Page {
    /// Description text if the page has a non-empty one.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Public link to the page: `site_url` followed by the page path.
    #[must_use]
    pub fn link(&self, site_url: &str) -> String {
        format!("{site_url}{}", self.path)
    }
}

/// Last-seen timestamps for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// `createdAt` as first observed
    pub created_at: String,
    /// `updatedAt` as last notified or seeded
    pub updated_at: String,
}

impl From<&Page> for CacheEntry {
    fn from(page: &Page) -> Self {
        Self {
            created_at: page.created_at.clone(),
            updated_at: page.updated_at.clone(),
        }
    }
}
