//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and link status checks
//! - HTML parsing and link extraction
//! - The per-page crawl task
//! - Overall crawl supervision

mod fetcher;
mod parser;
mod supervisor;
mod task;

pub use fetcher::{build_http_client, check_status, fetch_page, FetchError, FetchedPage};
pub use parser::{extract_links, parse_html, ParsedPage};
pub use supervisor::{CompletionSummary, Supervisor};
pub use task::{crawl_page, CrawlContext, PageTask, TaskOutcome};

use crate::config::Config;
use crate::output::LinkSink;
use crate::RippleError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for a crawl without a progress view. It will:
/// 1. Build the HTTP client
/// 2. Crawl the seed page and every healthy same-domain page reachable from it
/// 3. Record every checked link in `sink`
///
/// # Returns
///
/// * `Ok(CompletionSummary)` - Crawl completed
/// * `Err(RippleError)` - Setup failed (config, HTTP client or seed URL)
pub async fn crawl(
    config: &Config,
    seed: &str,
    sink: Arc<dyn LinkSink>,
) -> Result<CompletionSummary, RippleError> {
    Supervisor::new(config, sink)?.run(seed).await
}
