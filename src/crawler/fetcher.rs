//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the shared HTTP client with the configured user agent and timeout
//! - GET requests for pages that will be parsed for links
//! - GET requests that only check a link's status code
//!
//! Nothing here retries. A failed page fetch ends the task that asked for it;
//! a failed status check is reported as status 0.

use crate::config::Config;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Maximum redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// A fetched page ready for link extraction
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use link_ripple::config::Config;
/// use link_ripple::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.crawler.request_timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body for link extraction
///
/// Any HTTP status is accepted; error pages are parsed like any other page.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();

    let body = response.text().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchedPage {
        final_url,
        status_code,
        body,
    })
}

/// Checks a link with a GET request and returns its status code
///
/// Returns 0 when no HTTP response was received (connection refused,
/// timeout, TLS failure, too many redirects, malformed URL).
pub async fn check_status(client: &Client, url: &str) -> u16 {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            tracing::debug!("Status {} for {}", status, url);
            status
        }
        Err(e) => {
            if e.is_timeout() {
                tracing::debug!("Timed out checking {}", url);
            } else if e.is_connect() {
                tracing::debug!("Connection failed checking {}", url);
            } else {
                tracing::debug!("Error checking {}: {}", url, e);
            }
            0
        }
    }
}
