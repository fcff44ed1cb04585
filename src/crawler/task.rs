//! Crawl task - the unit of work for one page
//!
//! A task fetches its page, walks the page's links in document order and, for
//! each link that survives classification and dedup, checks its status,
//! records it and updates the counters. Healthy same-domain links are sent to
//! the supervisor as child pages as soon as their check returns.

use crate::crawler::fetcher::{check_status, fetch_page};
use crate::crawler::parser::parse_html;
use crate::output::{LinkRecord, LinkSink};
use crate::state::{CheckOutcome, ProgressAggregator, VisitedRegistry};
use crate::url::{classify, is_fragment_only, is_same_domain, is_sitemap_like, normalize};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Shared state handed to every task of one crawl run
pub struct CrawlContext {
    pub client: Client,
    pub registry: VisitedRegistry,
    pub progress: Arc<ProgressAggregator>,
    pub sink: Arc<dyn LinkSink>,
    /// Child pages go straight to the supervisor's work queue
    pub children: mpsc::UnboundedSender<PageTask>,
}

/// A page waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    /// URL the page is fetched from; also the base links are resolved against
    pub url: String,

    /// Link distance from the seed page
    pub depth: u32,
}

impl PageTask {
    /// The seed page of a run
    pub fn root(url: &str) -> Self {
        Self {
            url: url.to_string(),
            depth: 0,
        }
    }

    fn child(&self, url: String) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}

/// What a finished task reports back to the supervisor
#[derive(Debug, Clone, Default)]
pub struct TaskOutcome {
    /// The page this task crawled
    pub page: String,

    /// Whether the page was fetched at all
    pub fetched: bool,

    /// Links whose status was checked and recorded
    pub links_checked: usize,

    /// Child crawls requested while the task ran
    pub children_requested: usize,
}

/// Crawls one page
///
/// # Per-link steps
///
/// 1. Skip links carrying a fragment
/// 2. Normalize against the page URL
/// 3. Skip keys already admitted to the registry
/// 4. Skip sitemap and robots resources
/// 5. Count, check and record the link
/// 6. On HTTP 200, request a child crawl for same-domain links whose raw
///    href differs from the page URL. The request is sent immediately, so the
///    child can start while this task is still checking later links.
///
/// Never fails: fetch errors end the task early, sink errors are logged.
pub async fn crawl_page(ctx: &CrawlContext, task: PageTask) -> TaskOutcome {
    let mut outcome = TaskOutcome {
        page: task.url.clone(),
        ..TaskOutcome::default()
    };

    let base = match Url::parse(&task.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Skipping page with unparseable URL {}: {}", task.url, e);
            return outcome;
        }
    };

    let page = match fetch_page(&ctx.client, &task.url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Error fetching page: {}", e);
            return outcome;
        }
    };
    outcome.fetched = true;

    let parsed = parse_html(&page.body);
    tracing::debug!(
        "Crawling {} (status {}, final URL {}): {} links",
        task.url,
        page.status_code,
        page.final_url,
        parsed.links.len()
    );

    for link in parsed.links {
        tracing::trace!("{} on {}: {:?}", link, task.url, classify(&link, &base));

        if is_fragment_only(&link) {
            tracing::trace!("Skipping fragment link {}", link);
            continue;
        }

        let resolved = normalize(&link, &base);

        if !ctx.registry.try_admit(&resolved) {
            continue;
        }

        if is_sitemap_like(&resolved) {
            tracing::debug!("Skipping sitemap: {}", resolved);
            continue;
        }

        ctx.progress.begin_check();
        let status_code = check_status(&ctx.client, &resolved).await;

        let record = LinkRecord::new(&task.url, &resolved, status_code);
        if let Err(e) = ctx.sink.append(&record) {
            tracing::warn!("Failed to record {} -> {}: {}", task.url, resolved, e);
        }
        outcome.links_checked += 1;

        let check = CheckOutcome::from_status(status_code);
        if check == CheckOutcome::Valid {
            // Raw href against the raw page URL, not the normalized key.
            if is_same_domain(&link, &base) && link != task.url {
                if ctx.children.send(task.child(resolved.clone())).is_ok() {
                    outcome.children_requested += 1;
                } else {
                    tracing::debug!("Run is over, not crawling {}", resolved);
                }
            }
        } else {
            tracing::info!("Broken link on {}: {} ({})", task.url, resolved, status_code);
        }
        ctx.progress.record(check);
    }

    outcome
}
