use crate::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Shared `reqwest` client setup for the wiki and Telegram clients.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("wikinotify/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .build()
        .map_err(Error::Network)
}

/// Reads the body of a failed response into an [`Error::Api`].
pub(crate) async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    Error::Api { status, body }
}
