use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Aggregate link counters for one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Links admitted and checked (excludes fragment and sitemap links)
    pub total: u64,
    /// Links that answered HTTP 200
    pub valid: u64,
    /// Links that answered anything else, or failed to fetch
    pub broken: u64,
}

impl Counters {
    /// Checks that have started but not yet been classified
    pub fn pending(&self) -> u64 {
        self.total.saturating_sub(self.valid + self.broken)
    }
}

/// Result of a single reachability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid,
    Broken,
}

impl CheckOutcome {
    /// Only HTTP 200 counts as valid; status 0 means the fetch failed
    pub fn from_status(status_code: u16) -> Self {
        if status_code == 200 {
            Self::Valid
        } else {
            Self::Broken
        }
    }
}

/// What observers of the aggregator receive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub counters: Counters,
    /// Set once the supervisor has seen every task finish
    pub finished: bool,
}

/// Counters shared by every task of one crawl run
///
/// A run owns its aggregator; nothing is shared between runs. Updates happen under one mutex and are published to observers through a
/// `watch` channel. Publishing never blocks: observers that fall behind only
/// see the latest snapshot.
#[derive(Debug)]
pub struct ProgressAggregator {
    counters: Mutex<Counters>,
    tx: watch::Sender<ProgressSnapshot>,
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressAggregator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self {
            counters: Mutex::new(Counters::default()),
            tx,
        }
    }

    /// Subscribes to counter changes
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Counts a link that is about to be checked
    pub fn begin_check(&self) {
        self.update(|c| c.total += 1);
    }

    /// Records the outcome of a check started with [`begin_check`](Self::begin_check)
    pub fn record(&self, outcome: CheckOutcome) {
        self.update(|c| match outcome {
            CheckOutcome::Valid => c.valid += 1,
            CheckOutcome::Broken => c.broken += 1,
        });
    }

    /// Consistent read of all three counters
    pub fn snapshot(&self) -> Counters {
        *self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the run as finished and publishes the final counters
    pub fn finish(&self) {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        self.tx.send_replace(ProgressSnapshot {
            counters: *counters,
            finished: true,
        });
    }

    // Publishes while holding the lock so observers never see counters go backwards.
    fn update(&self, apply: impl FnOnce(&mut Counters)) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut counters);
        self.tx.send_replace(ProgressSnapshot {
            counters: *counters,
            finished: false,
        });
    }
}
