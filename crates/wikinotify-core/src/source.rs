//! Wiki.js GraphQL client that lists every page in one request.

use crate::http::{api_error, build_client};
use crate::{Config, Error, Page, Result, WikiConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// GraphQL query listing every page with the fields change detection needs.
pub const PAGES_QUERY: &str = "{ pages { list { id title description path createdAt updatedAt } } }";

/// Anything that can produce the current list of wiki pages.
#[async_trait]
pub trait PageSource {
    /// Fetch the full page list in one call.
    async fn fetch_pages(&self) -> Result<Vec<Page>>;
}

/// HTTP client for the Wiki.js GraphQL API
pub struct WikiClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl WikiClient {
    /// Creates a client for the configured wiki using the configured timeout
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(&config.wiki, config.request_timeout())
    }

    /// Creates a client with a custom request timeout (primarily for tests)
    pub fn with_timeout(wiki: &WikiConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: wiki.graphql_url.clone(),
            token: wiki.api_token.clone(),
        })
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<PagesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct PagesData {
    pages: Option<PagesList>,
}

#[derive(Deserialize)]
struct PagesList {
    list: Option<Vec<Page>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Pulls `data.pages.list` out of a GraphQL response body.
fn extract_pages(body: &str) -> Result<Vec<Page>> {
    let response: GraphQlResponse = serde_json::from_str(body)?;
    let list = response.data.and_then(|d| d.pages).and_then(|p| p.list);

    match list {
        Some(pages) => {
            if !response.errors.is_empty() {
                warn!(
                    errors = %join_messages(&response.errors),
                    "Wiki returned pages alongside GraphQL errors"
                );
            }
            Ok(pages)
        },
        None if !response.errors.is_empty() => {
            Err(Error::GraphQl(join_messages(&response.errors)))
        },
        None => Err(Error::GraphQl(
            "response carried no data.pages.list".to_string(),
        )),
    }
}

#[async_trait]
impl PageSource for WikiClient {
    async fn fetch_pages(&self) -> Result<Vec<Page>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&GraphQlRequest { query: PAGES_QUERY })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response.text().await?;
        let pages = extract_pages(&body)?;
        debug!("Fetched {} pages from {}", pages.len(), self.endpoint);
        Ok(pages)
    }
}
