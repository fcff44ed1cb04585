//! Output module for crawl results
//!
//! This module handles:
//! - Appending one record per checked link to a durable CSV sink
//! - Rendering live crawl counters in the terminal

mod csv_sink;
pub mod progress;
mod traits;

pub use csv_sink::{CsvSink, CSV_HEADERS};
pub use progress::{quit_signal, ProgressView, ViewExit};
pub use traits::{LinkRecord, LinkSink, SinkError, SinkResult};
