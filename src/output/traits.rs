//! Output sink traits and types
//!
//! This module defines the record written for every checked link and the
//! trait interface durable sinks implement.

use thiserror::Error;

/// Errors that can occur while writing link records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// One checked link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Page the link was found on
    pub source_page: String,

    /// Normalized link target
    pub target_link: String,

    /// HTTP status code, or 0 when the request failed
    pub status_code: u16,
}

impl LinkRecord {
    pub fn new(source_page: &str, target_link: &str, status_code: u16) -> Self {
        Self {
            source_page: source_page.to_string(),
            target_link: target_link.to_string(),
            status_code,
        }
    }
}

/// Trait for durable record sinks
///
/// Implementations are shared by every crawl task and must serialize
/// concurrent appends themselves.
pub trait LinkSink: Send + Sync {
    /// Appends one record
    fn append(&self, record: &LinkRecord) -> SinkResult<()>;
}
