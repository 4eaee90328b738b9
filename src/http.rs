//! HTTP plumbing shared by the listing, metadata and download code.
//!
//! Transport failures and non-success statuses become
//! [`DownloaderError::Network`]; bodies that arrive but do not parse become
//! [`DownloaderError::Decode`]. Keeping the two apart lets callers tell "the
//! server is down" from "the server published garbage".

use crate::constants::USER_AGENT;
use crate::core::{DownloaderError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Build the shared client. Timeouts are applied per request.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DownloaderError::network("build HTTP client", e))
}

/// Send a GET and fail on transport errors or non-success statuses.
///
/// `timeout` bounds the whole exchange when given; `None` leaves it unbounded.
pub async fn get(
    client: &reqwest::Client,
    url: &str,
    timeout: Option<Duration>,
    operation: &str,
) -> Result<reqwest::Response> {
    debug!("GET {} ({})", url, operation);

    let mut request = client.get(url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| DownloaderError::network(operation, e))?;
    response.error_for_status().map_err(|e| DownloaderError::network(operation, e))
}

/// GET `url` and decode the body as JSON.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    operation: &str,
) -> Result<T> {
    let response = get(client, url, Some(timeout), operation).await?;
    let body = response.bytes().await.map_err(|e| DownloaderError::network(operation, e))?;
    serde_json::from_slice(&body).map_err(|e| DownloaderError::decode(operation, e))
}
