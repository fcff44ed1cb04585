//! State module for tracking crawl progress
//!
//! This module provides the crawl-wide state shared by every task of a run.
//!
//! # Components
//!
//! - `VisitedRegistry`: exactly-once admission of normalized URLs
//! - `ProgressAggregator`: total/valid/broken counters and their change notifications

mod progress;
mod registry;

// Re-export main types
pub use progress::{CheckOutcome, Counters, ProgressAggregator, ProgressSnapshot};
pub use registry::VisitedRegistry;
