//! Live progress view
//!
//! Renders the crawl counters on a single terminal line, refreshed whenever
//! the aggregator publishes a change. The view and the crawl have separate
//! lifecycles: quitting the view leaves the crawl running.

use crate::state::ProgressSnapshot;
use std::future::Future;
use std::io::{self, Write};
use tokio::sync::watch;

/// Why the view stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewExit {
    /// The crawl finished and the final counters were rendered
    Completed,
    /// The operator asked the view to quit
    Quit,
}

enum Wake {
    Changed,
    Closed,
    Quit,
}

/// Terminal renderer for [`ProgressSnapshot`]s
pub struct ProgressView<W: Write> {
    rx: watch::Receiver<ProgressSnapshot>,
    out: W,
}

impl<W: Write> ProgressView<W> {
    pub fn new(rx: watch::Receiver<ProgressSnapshot>, out: W) -> Self {
        Self { rx, out }
    }

    /// Formats one status line
    pub fn format_line(snapshot: &ProgressSnapshot) -> String {
        let c = &snapshot.counters;
        let status = if snapshot.finished {
            "finished"
        } else {
            "running"
        };
        format!(
            "[{}] links: {} | valid: {} | broken: {}",
            status, c.total, c.valid, c.broken
        )
    }

    /// Redraws the status line
    pub fn render(&mut self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        write!(self.out, "\r{}", Self::format_line(snapshot))?;
        if snapshot.finished {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    /// Renders every change until the crawl finishes or `quit` resolves
    pub async fn run_until<Q>(&mut self, quit: Q) -> io::Result<ViewExit>
    where
        Q: Future<Output = ()>,
    {
        tokio::pin!(quit);

        loop {
            let snapshot = *self.rx.borrow_and_update();
            self.render(&snapshot)?;
            if snapshot.finished {
                return Ok(ViewExit::Completed);
            }

            let wake = tokio::select! {
                changed = self.rx.changed() => match changed {
                    Ok(()) => Wake::Changed,
                    Err(_) => Wake::Closed,
                },
                _ = &mut quit => Wake::Quit,
            };

            match wake {
                Wake::Changed => continue,
                Wake::Closed => {
                    writeln!(self.out)?;
                    return Ok(ViewExit::Completed);
                }
                Wake::Quit => {
                    writeln!(self.out)?;
                    self.out.flush()?;
                    return Ok(ViewExit::Quit);
                }
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Resolves when the operator presses Ctrl-C
///
/// If the signal handler cannot be installed the future never resolves, so
/// the view keeps running until the crawl completes.
pub async fn quit_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
