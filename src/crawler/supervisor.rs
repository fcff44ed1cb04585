//! Crawl supervisor - owns a run and every task in it
//!
//! Every run gets its own registry and counters, so runs on one supervisor
//! never see each other's state. The run starts the root task on the seed URL
//! and starts child tasks as tasks request them, until the task tree is empty.
//! At most `max-concurrent-tasks` tasks run at once; child pages beyond that
//! wait in a FIFO queue.

use crate::config::{validate, Config, CrawlerConfig};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::task::{crawl_page, CrawlContext, PageTask, TaskOutcome};
use crate::output::LinkSink;
use crate::state::{Counters, ProgressAggregator, VisitedRegistry};
use crate::url::parse_seed;
use crate::RippleError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Summary of a completed crawl run
#[derive(Debug, Clone)]
pub struct CompletionSummary {
    /// The seed URL the run started from
    pub seed: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages whose crawl task ran (fetched or not)
    pub pages_crawled: usize,

    /// Child pages dropped by the page or depth limits
    pub pages_skipped: usize,

    /// Distinct normalized URLs admitted during the run
    pub urls_admitted: usize,

    /// Final link counters
    pub counters: Counters,
}

impl CompletionSummary {
    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drives crawl runs
pub struct Supervisor {
    config: CrawlerConfig,
    client: Client,
    sink: Arc<dyn LinkSink>,
}

impl Supervisor {
    /// Creates a supervisor with an HTTP client built from `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Supervisor)` - Ready to run
    /// * `Err(RippleError)` - The config is invalid or the HTTP client could not be built
    pub fn new(config: &Config, sink: Arc<dyn LinkSink>) -> Result<Self, RippleError> {
        validate(config)?;
        let client = build_http_client(config)?;
        Ok(Self::with_client(config.crawler.clone(), client, sink))
    }

    /// Creates a supervisor around an existing HTTP client
    pub fn with_client(config: CrawlerConfig, client: Client, sink: Arc<dyn LinkSink>) -> Self {
        Self {
            config,
            client,
            sink,
        }
    }

    /// Crawls everything reachable from `seed`
    ///
    /// Returns once every task, at any depth, has finished. The only error is
    /// an invalid seed, reported before any request is made.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use link_ripple::config::Config;
    /// use link_ripple::crawler::Supervisor;
    /// use link_ripple::output::CsvSink;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let sink = Arc::new(CsvSink::open("urls.csv")?);
    /// let supervisor = Supervisor::new(&Config::default(), sink)?;
    /// let summary = supervisor.run("https://example.com/").await?;
    /// println!("{} broken links", summary.counters.broken);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, seed: &str) -> Result<CompletionSummary, RippleError> {
        self.run_with_progress(seed, ProgressAggregator::new()).await
    }

    /// Like [`run`](Self::run), publishing the run's counters through `progress`
    ///
    /// Subscribe to `progress` before handing it over; the run takes ownership
    /// so its counters cannot be shared with another run.
    pub async fn run_with_progress(
        &self,
        seed: &str,
        progress: ProgressAggregator,
    ) -> Result<CompletionSummary, RippleError> {
        let seed = seed.trim();
        parse_seed(seed)?;

        let (children_tx, mut children_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(CrawlContext {
            client: self.client.clone(),
            registry: VisitedRegistry::new(),
            progress: Arc::new(progress),
            sink: Arc::clone(&self.sink),
            children: children_tx,
        });

        let started_at = Utc::now();
        tracing::info!("Starting crawl from {}", seed);

        let mut pending = VecDeque::from([PageTask::root(seed)]);
        let mut in_flight: JoinSet<TaskOutcome> = JoinSet::new();
        let mut pages_crawled = 0usize;
        let mut pages_skipped = 0usize;

        loop {
            // Tasks send their children before finishing, so once `in_flight`
            // is empty this drain has seen every request of the run.
            while let Ok(child) = children_rx.try_recv() {
                if !self.queue_child(child, &mut pending) {
                    pages_skipped += 1;
                }
            }

            while in_flight.len() < self.config.max_concurrent_tasks {
                let Some(task) = pending.pop_front() else {
                    break;
                };

                if self.page_limit_reached(pages_crawled) {
                    tracing::info!(
                        "Page limit reached, dropping {} queued pages",
                        pending.len() + 1
                    );
                    pages_skipped += pending.len() + 1;
                    pending.clear();
                    break;
                }

                pages_crawled += 1;
                let ctx = Arc::clone(&ctx);
                in_flight.spawn(async move { crawl_page(&ctx, task).await });
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                Some(child) = children_rx.recv() => {
                    if !self.queue_child(child, &mut pending) {
                        pages_skipped += 1;
                    }
                }
                Some(joined) = in_flight.join_next() => match joined {
                    Ok(outcome) => tracing::debug!(
                        "Finished {} ({} links checked, {} children, {} in flight, {} queued)",
                        outcome.page,
                        outcome.links_checked,
                        outcome.children_requested,
                        in_flight.len(),
                        pending.len()
                    ),
                    Err(e) => tracing::warn!("Crawl task failed: {}", e),
                },
                else => break,
            }
        }

        ctx.progress.finish();

        let summary = CompletionSummary {
            seed: seed.to_string(),
            started_at,
            finished_at: Utc::now(),
            pages_crawled,
            pages_skipped,
            urls_admitted: ctx.registry.len(),
            counters: ctx.progress.snapshot(),
        };

        tracing::info!(
            "Crawl completed: {} pages, {} links ({} valid, {} broken) in {}s",
            summary.pages_crawled,
            summary.counters.total,
            summary.counters.valid,
            summary.counters.broken,
            summary.duration().num_seconds()
        );

        Ok(summary)
    }

    /// Queues a requested child page; false if the depth limit drops it
    fn queue_child(&self, child: PageTask, pending: &mut VecDeque<PageTask>) -> bool {
        if self.within_depth(&child) {
            pending.push_back(child);
            true
        } else {
            tracing::debug!("Depth limit reached, not crawling {}", child.url);
            false
        }
    }

    fn page_limit_reached(&self, pages_crawled: usize) -> bool {
        self.config
            .max_pages
            .is_some_and(|max| pages_crawled >= max)
    }

    fn within_depth(&self, task: &PageTask) -> bool {
        self.config.max_depth.map_or(true, |max| task.depth <= max)
    }
}
